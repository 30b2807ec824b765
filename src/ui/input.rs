/// Terminal input collector.
///
/// Drains pending crossterm events once per frame and keeps the key
/// presses in arrival order. Release events are ignored: the server
/// protocol only knows about keypresses.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

pub struct InputState {
    /// Key presses seen during the most recent `drain_events()`.
    pub presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    pub fn drain_events(&mut self) {
        self.presses.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn record(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Release {
            self.presses.push(key);
        }
    }

    /// Key codes to hand to the session, with Ctrl chords filtered out.
    pub fn keypresses(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.presses
            .iter()
            .filter(|k| !k.modifiers.contains(KeyModifiers::CONTROL))
            .map(|k| k.code)
    }

    /// Check if any press this frame is Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
