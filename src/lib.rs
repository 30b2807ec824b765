/// Terminal client for remote text/tile game sessions.
///
/// The server drives everything through a closed set of JSON commands
/// (`session::protocol`); `session::dispatch::Session` applies them to
/// the text regions, the tile canvas, the option cache and the chat
/// overlay. `ui` draws the result with crossterm.

pub mod config;
pub mod domain;
pub mod error;
pub mod session;
pub mod ui;
