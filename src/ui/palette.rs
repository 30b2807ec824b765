/// Color palette: server color indices → terminal colors.
///
/// 0-15 are the classic console colors. Anything above maps onto the
/// terminal's 256-color table, except 16, which the server uses as its
/// "default text" color.

use crossterm::style::Color;

const CONSOLE: [Color; 16] = [
    Color::Black,
    Color::DarkBlue,
    Color::DarkGreen,
    Color::DarkCyan,
    Color::DarkRed,
    Color::DarkMagenta,
    Color::DarkYellow,
    Color::Grey,
    Color::DarkGrey,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::White,
];

pub const DEFAULT_TEXT: u8 = 16;

#[derive(Clone, Copy, Debug, Default)]
pub struct Palette;

impl Palette {
    pub fn color(&self, index: u8) -> Color {
        match index {
            0..=15 => CONSOLE[index as usize],
            DEFAULT_TEXT => Color::Grey,
            n => Color::AnsiValue(n),
        }
    }

    /// Background color; index 0 is the renderer's base background
    /// rather than pure black.
    pub fn background(&self, index: u8) -> Color {
        match index {
            0 => Color::Reset,
            n => self.color(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_range() {
        let p = Palette;
        assert_eq!(p.color(4), Color::DarkRed);
        assert_eq!(p.color(15), Color::White);
    }

    #[test]
    fn default_text_and_extended() {
        let p = Palette;
        assert_eq!(p.color(DEFAULT_TEXT), Color::Grey);
        assert_eq!(p.color(200), Color::AnsiValue(200));
        assert_eq!(p.background(0), Color::Reset);
    }
}
