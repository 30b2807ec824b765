pub mod chat;
pub mod options;
pub mod surface;
pub mod terminal;
pub mod tiles;
