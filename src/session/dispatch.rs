/// Session state and the command dispatcher.
///
/// `Session` owns every piece of per-connection state: options, the
/// terminal/layer manager, the tile renderer, and the chat overlay. It
/// is the only consumer of inbound messages and applies them strictly
/// one at a time, in arrival order.
///
/// Nothing a server sends can end the session. Messages that fail to
/// decode, or commands a component rejects, are logged and dropped.

use crossterm::event::KeyCode;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::domain::chat::ChatOverlay;
use crate::domain::options::OptionCache;
use crate::domain::terminal::{Layer, Region, TerminalManager};
use crate::domain::tiles::{TileInfoSource, TileRenderer};
use crate::error::{CommandError, TileError};
use crate::session::outbound::Outbound;
use crate::session::protocol::{self, ActorPart, Command};

const LOGIN_FAILED_TEXT: &str = "Login failed.";

/// Running totals, mostly for the log and the headless dump.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: u64,
    pub dropped: u64,
}

pub struct Session {
    options: OptionCache,
    terminal: TerminalManager,
    tiles: TileRenderer,
    chat: ChatOverlay,
    outbound: Vec<Outbound>,
    chat_key: char,
    stats: DispatchStats,
}

impl Session {
    pub fn new(cfg: &ClientConfig, source: Box<dyn TileInfoSource>) -> Self {
        let mut session = Session {
            options: OptionCache::new(),
            terminal: TerminalManager::new(&cfg.text),
            tiles: TileRenderer::new(&cfg.viewport, source),
            chat: ChatOverlay::new(&cfg.chat),
            outbound: Vec::new(),
            chat_key: cfg.chat.toggle_key,
            stats: DispatchStats::default(),
        };
        session.terminal.set_layer(Layer::Crt);
        session
    }

    // ── Accessors ──

    pub fn options(&self) -> &OptionCache {
        &self.options
    }

    pub fn terminal(&self) -> &TerminalManager {
        &self.terminal
    }

    pub fn tiles(&self) -> &TileRenderer {
        &self.tiles
    }

    pub fn chat(&self) -> &ChatOverlay {
        &self.chat
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Take everything queued for the server since the last call.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    // ── Inbound ──

    /// Decode and apply one raw message. Returns whether it was applied.
    pub fn handle_message(&mut self, raw: &str) -> bool {
        match protocol::decode(raw) {
            Ok(cmd) => self.dispatch(cmd),
            Err(e) => {
                warn!(error = %e, message = raw, "dropping inbound message");
                self.stats.dropped += 1;
                false
            }
        }
    }

    pub fn dispatch(&mut self, cmd: Command) -> bool {
        let result = self.apply(&cmd);
        match result {
            Ok(()) => {
                self.stats.applied += 1;
                true
            }
            Err(error) => {
                warn!(op = cmd.op(), command = ?cmd, %error, "command rejected");
                self.stats.dropped += 1;
                false
            }
        }
    }

    fn apply(&mut self, cmd: &Command) -> Result<(), CommandError> {
        match cmd {
            Command::Goto { x, y, region } => self.terminal.goto(*x, *y, *region),
            Command::PutChar { ch } => self.terminal.put_char(*ch),
            Command::PutString { text } => self.terminal.put_string(text),
            Command::ClearRegion => self.terminal.clear_region(),
            Command::SetFg { color } => self.terminal.set_fg(*color),
            Command::SetBg { color } => self.terminal.set_bg(*color),
            Command::SetLayer { layer } => self.terminal.set_layer(*layer),
            Command::ResizeRegion { region, cols, rows } => self.terminal.resize_region(*region, *cols, *rows)?,
            Command::ResizeViewport { cols, rows } => {
                self.tiles.resize_viewport(*cols, *rows)?;
            }
            Command::DrawBackground { x, y, tile } => self.tiles.draw_background(*x, *y, *tile)?,
            Command::DrawForeground { x, y, tile } => self.tiles.draw_foreground(*x, *y, *tile)?,
            Command::DrawActor { x, y, part, dx, dy } => self.tiles.draw_actor(*x, *y, *part, *dx, *dy)?,
            Command::DrawCell { x, y, bg, fg, actors } => self.draw_cell(*x, *y, *bg, *fg, actors)?,
            Command::SetOptions { options } => self.options.set(options.clone()),
            Command::ClearOptions => self.options.clear(),
            Command::UpdateWatchers { count, names } => self.chat.update_watchers(*count, names),
            Command::PostMessage { text } => self.chat.post_message(text),
            Command::ClearChat => self.chat.reset(),
            Command::Ping => self.send(Outbound::Pong),
            Command::ConnectionClosed { reason } => {
                info!(%reason, "server closed the connection");
                self.reset();
                self.terminal.set_layer(Layer::Crt);
                self.terminal.goto(1, 1, Region::Crt);
                self.terminal.put_string(reason);
            }
            Command::LoginFailed => {
                self.terminal.goto(1, 1, Region::Crt);
                self.terminal.put_string(LOGIN_FAILED_TEXT);
            }
        }
        Ok(())
    }

    /// Composite one cell back to front. A missing foreground or actor
    /// sprite stops the cell there; whatever was drawn stays.
    fn draw_cell(&mut self, x: i32, y: i32, bg: u32, fg: Option<u32>, actors: &[ActorPart]) -> Result<(), TileError> {
        self.tiles.draw_background(x, y, bg)?;
        if let Some(fg) = fg {
            self.tiles.draw_foreground(x, y, fg)?;
        }
        for a in actors {
            self.tiles.draw_actor(x, y, a.part, a.dx, a.dy)?;
        }
        Ok(())
    }

    /// Session teardown: every component goes back to its initial state.
    /// The canvas is dropped; region sizes and the visible layer stay.
    pub fn reset(&mut self) {
        self.chat.reset();
        self.options.clear();
        self.terminal.reset();
        self.tiles.reset();
    }

    // ── Outbound ──

    fn send(&mut self, msg: Outbound) {
        debug!(payload = %msg.encode(), "queue outbound");
        self.outbound.push(msg);
    }

    /// Route one keypress: chat input when it has focus, otherwise the
    /// chat key opens chat and everything else goes to the server.
    pub fn handle_key(&mut self, code: KeyCode) {
        if self.chat.input_focused() {
            if let Some(msg) = self.chat.handle_key(code) {
                self.send(msg);
            }
            return;
        }
        if code == KeyCode::Char(self.chat_key) {
            self.chat.focus_input();
            return;
        }
        match Outbound::from_keypress(code) {
            Some(msg) => self.send(msg),
            None => debug!(key = ?code, "key without payload"),
        }
    }
}
