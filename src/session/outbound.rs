/// Client → server messages. Fire-and-forget; nothing waits for a reply.

use crossterm::event::KeyCode;

pub const CHAT_PREFIX: &str = "Chat: ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// A single keypress, sent as one character.
    Key(char),
    /// A line typed into the chat input.
    Chat(String),
    /// Answer to a server `ping`.
    Pong,
}

impl Outbound {
    /// Keypresses that have a character code. Navigation keys and the
    /// like produce nothing.
    pub fn from_keypress(code: KeyCode) -> Option<Outbound> {
        let ch = match code {
            KeyCode::Char(c) => c,
            KeyCode::Enter => '\r',
            KeyCode::Esc => '\x1b',
            KeyCode::Backspace => '\x08',
            KeyCode::Tab => '\t',
            _ => return None,
        };
        Some(Outbound::Key(ch))
    }

    /// Wire payload.
    pub fn encode(&self) -> String {
        match self {
            Outbound::Key(c) => c.to_string(),
            Outbound::Chat(text) => format!("{CHAT_PREFIX}{text}"),
            Outbound::Pong => "Pong".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_is_prefixed() {
        assert_eq!(Outbound::Chat("hi".into()).encode(), "Chat: hi");
    }

    #[test]
    fn key_is_a_single_character() {
        assert_eq!(Outbound::Key('k').encode(), "k");
        assert_eq!(Outbound::from_keypress(KeyCode::Enter), Some(Outbound::Key('\r')));
    }

    #[test]
    fn arrow_keys_have_no_payload() {
        assert_eq!(Outbound::from_keypress(KeyCode::Left), None);
    }
}
