/// Chat / spectator overlay.
///
/// Tracks the spectator list, the chat log, and how many messages
/// arrived while the panel was closed. The banner line is what the
/// presenter shows when the panel is collapsed.

use crossterm::event::KeyCode;
use tracing::debug;

use crate::config::ChatConfig;
use crate::session::outbound::Outbound;

pub struct ChatOverlay {
    log: Vec<String>,
    spectator_count: u32,
    spectator_names: String,
    unread: u32,
    visible: bool,
    banner: String,
    input: String,
    input_focused: bool,
    /// Index of the first log line shown; `log.len()` means "at bottom".
    scroll: usize,
    dismiss_hint: String,
    unread_suffix: String,
}

impl ChatOverlay {
    pub fn new(cfg: &ChatConfig) -> Self {
        let mut chat = ChatOverlay {
            log: Vec::new(),
            spectator_count: 0,
            spectator_names: String::new(),
            unread: 0,
            visible: false,
            banner: String::new(),
            input: String::new(),
            input_focused: false,
            scroll: 0,
            dismiss_hint: cfg.dismiss_hint.clone(),
            unread_suffix: cfg.unread_suffix.clone(),
        };
        chat.update_message_count();
        chat
    }

    // ── Read access ──

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    pub fn has_new(&self) -> bool {
        self.unread > 0
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn spectator_line(&self) -> String {
        format!("{} spectators", self.spectator_count)
    }

    pub fn spectator_names(&self) -> &str {
        &self.spectator_names
    }

    // ── Operations ──

    pub fn update_watchers(&mut self, count: u32, names: &str) {
        self.spectator_count = count;
        self.spectator_names = names.to_string();
    }

    pub fn post_message(&mut self, text: &str) {
        self.log.push(text.to_string());
        self.scroll_to_bottom();
        if !self.visible {
            self.unread += 1;
            self.update_message_count();
        }
    }

    pub fn toggle_panel(&mut self) {
        if self.visible {
            self.visible = false;
            self.update_message_count();
        } else {
            self.visible = true;
            self.unread = 0;
            self.update_message_count();
            self.banner = self.dismiss_hint.clone();
        }
        debug!(visible = self.visible, "chat panel toggled");
    }

    pub fn focus_input(&mut self) {
        if !self.visible {
            self.toggle_panel();
        }
        self.scroll_to_bottom();
        self.input_focused = true;
    }

    pub fn reset(&mut self) {
        self.spectator_names.clear();
        self.spectator_count = 0;
        self.log.clear();
        self.scroll = 0;
        self.unread = 0;
        self.update_message_count();
        self.visible = false;
        self.input_focused = false;
        self.input.clear();
    }

    /// Key handling while the input line has focus.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<Outbound> {
        match code {
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                Some(Outbound::Chat(text))
            }
            KeyCode::Esc => {
                self.toggle_panel();
                self.input_focused = false;
                None
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }

    // ── Internal ──

    fn scroll_to_bottom(&mut self) {
        self.scroll = self.log.len();
    }

    fn update_message_count(&mut self) {
        let suffix = if self.unread > 0 { self.unread_suffix.as_str() } else { "" };
        self.banner = format!("{} new messages{}", self.unread, suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chat() -> ChatOverlay {
        ChatOverlay::new(&ChatConfig::default())
    }

    #[test]
    fn starts_hidden_with_zero_banner() {
        let c = chat();
        assert!(!c.is_visible());
        assert_eq!(c.banner(), "0 new messages");
        assert_eq!(c.spectator_line(), "0 spectators");
    }

    #[test]
    fn message_while_hidden_counts_as_unread() {
        let mut c = chat();
        c.post_message("hello");
        assert_eq!(c.unread(), 1);
        assert!(c.has_new());
        assert_eq!(c.banner(), "1 new messages (Press _)");
        assert_eq!(c.log(), &["hello".to_string()]);
    }

    #[test]
    fn message_while_visible_is_not_unread() {
        let mut c = chat();
        c.toggle_panel();
        c.post_message("hello");
        assert_eq!(c.unread(), 0);
        assert_eq!(c.banner(), "(Esc: back to game)");
    }

    #[test]
    fn opening_panel_clears_unread() {
        let mut c = chat();
        for i in 0..5 {
            c.post_message(&format!("m{i}"));
        }
        assert_eq!(c.unread(), 5);
        c.toggle_panel();
        assert!(c.is_visible());
        assert_eq!(c.unread(), 0);
        assert_eq!(c.banner(), "(Esc: back to game)");
    }

    #[test]
    fn closing_panel_refreshes_counter() {
        let mut c = chat();
        c.toggle_panel();
        c.toggle_panel();
        assert!(!c.is_visible());
        assert_eq!(c.banner(), "0 new messages");
    }

    #[test]
    fn post_scrolls_to_bottom() {
        let mut c = chat();
        c.post_message("a");
        c.post_message("b");
        assert_eq!(c.scroll(), 2);
    }

    #[test]
    fn focus_opens_panel_and_focuses_input() {
        let mut c = chat();
        c.post_message("a");
        c.focus_input();
        assert!(c.is_visible());
        assert!(c.input_focused());
        assert_eq!(c.unread(), 0);
    }

    #[test]
    fn focus_on_open_panel_keeps_it_open() {
        let mut c = chat();
        c.toggle_panel();
        c.focus_input();
        assert!(c.is_visible());
    }

    #[test]
    fn enter_sends_and_clears_input() {
        let mut c = chat();
        c.focus_input();
        for ch in "hi all".chars() {
            assert_eq!(c.handle_key(KeyCode::Char(ch)), None);
        }
        assert_eq!(c.handle_key(KeyCode::Enter), Some(Outbound::Chat("hi all".into())));
        assert_eq!(c.input(), "");
    }

    #[test]
    fn backspace_edits_input() {
        let mut c = chat();
        c.focus_input();
        c.handle_key(KeyCode::Char('a'));
        c.handle_key(KeyCode::Char('b'));
        c.handle_key(KeyCode::Backspace);
        assert_eq!(c.input(), "a");
    }

    #[test]
    fn escape_closes_and_blurs() {
        let mut c = chat();
        c.focus_input();
        assert_eq!(c.handle_key(KeyCode::Esc), None);
        assert!(!c.is_visible());
        assert!(!c.input_focused());
    }

    #[test]
    fn reset_clears_everything_and_hides() {
        let mut c = chat();
        c.update_watchers(3, "alice, bob, carol");
        c.post_message("x");
        c.toggle_panel();
        c.reset();
        assert!(!c.is_visible());
        assert!(c.log().is_empty());
        assert_eq!(c.unread(), 0);
        assert_eq!(c.spectator_line(), "0 spectators");
        assert_eq!(c.spectator_names(), "");
        assert_eq!(c.banner(), "0 new messages");
    }

    #[test]
    fn watchers_overwrite() {
        let mut c = chat();
        c.update_watchers(2, "a, b");
        c.update_watchers(1, "a");
        assert_eq!(c.spectator_line(), "1 spectators");
        assert_eq!(c.spectator_names(), "a");
    }
}
