/// Terminal / layer manager.
///
/// Owns the three text regions, the cursor and the current colors, and
/// decides which layer is on screen:
///
///   - `crt`: full-screen text console
///   - `normal`: dungeon map + stat pane + message pane
///
/// Every text primitive writes relative to the region picked by the
/// last `goto`. There is no wrapping and no clamping: a write past the
/// edge of a region lands off-grid and is dropped by `TextArea`.

use serde::Deserialize;
use tracing::debug;

use crate::config::TextConfig;
use crate::domain::surface::TextArea;
use crate::error::RegionError;

// ── Layers, regions, panels ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Crt,
    Normal,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Crt,
    Msg,
    Stat,
}

impl Region {
    /// The layer a region is displayed on.
    pub fn layer(self) -> Layer {
        match self {
            Region::Crt => Layer::Crt,
            Region::Msg | Region::Stat => Layer::Normal,
        }
    }
}

/// How a panel is displayed. `InlineBlock` is the stat pane's mode when
/// shown; it has to be asserted explicitly on every switch to `normal`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Display {
    Hidden,
    Block,
    InlineBlock,
}

impl Display {
    pub fn is_visible(self) -> bool {
        self != Display::Hidden
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Panels {
    pub crt: Display,
    pub dungeon: Display,
    pub stats: Display,
    pub messages: Display,
}

impl Panels {
    fn all_hidden() -> Self {
        Panels {
            crt: Display::Hidden,
            dungeon: Display::Hidden,
            stats: Display::Hidden,
            messages: Display::Hidden,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cursor {
    pub x: i32,
    pub y: i32,
}

// ── TerminalManager ──

pub struct TerminalManager {
    layer: Option<Layer>,
    panels: Panels,
    crt: TextArea,
    stats: TextArea,
    messages: TextArea,
    region: Region,
    cursor: Cursor,
    fg: u8,
    bg: u8,
    default_fg: u8,
    default_bg: u8,
    max_region_cells: usize,
}

impl TerminalManager {
    pub fn new(cfg: &TextConfig) -> Self {
        TerminalManager {
            layer: None,
            panels: Panels::all_hidden(),
            crt: TextArea::new(cfg.crt_cols, cfg.crt_rows),
            stats: TextArea::new(cfg.stat_cols, cfg.stat_rows),
            messages: TextArea::new(cfg.msg_cols, cfg.msg_rows),
            region: Region::Crt,
            cursor: Cursor::default(),
            fg: cfg.default_fg,
            bg: cfg.default_bg,
            default_fg: cfg.default_fg,
            default_bg: cfg.default_bg,
            max_region_cells: cfg.max_region_cells,
        }
    }

    pub fn layer(&self) -> Option<Layer> {
        self.layer
    }

    pub fn panels(&self) -> Panels {
        self.panels
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn colors(&self) -> (u8, u8) {
        (self.fg, self.bg)
    }

    pub fn area(&self, region: Region) -> &TextArea {
        match region {
            Region::Crt => &self.crt,
            Region::Msg => &self.messages,
            Region::Stat => &self.stats,
        }
    }

    fn area_mut(&mut self, region: Region) -> &mut TextArea {
        match region {
            Region::Crt => &mut self.crt,
            Region::Msg => &mut self.messages,
            Region::Stat => &mut self.stats,
        }
    }

    /// Switch layers.
    ///
    ///   crt → crt          clear the console, show it, hide the rest
    ///   normal|none → crt  show the console, hide the rest
    ///   any → normal       hide the console, show dungeon/stats/messages
    pub fn set_layer(&mut self, target: Layer) {
        match target {
            Layer::Crt => {
                if self.layer == Some(Layer::Crt) {
                    self.crt.clear();
                }
                self.panels = Panels {
                    crt: Display::Block,
                    ..Panels::all_hidden()
                };
            }
            Layer::Normal => {
                self.panels = Panels {
                    crt: Display::Hidden,
                    dungeon: Display::Block,
                    stats: Display::InlineBlock,
                    messages: Display::Block,
                };
            }
        }
        debug!(from = ?self.layer, to = ?target, "layer switch");
        self.layer = Some(target);
    }

    /// Move the cursor and select the output region.
    ///
    /// The region's layer is entered only if it is not already active,
    /// so a `goto` into the console never wipes it.
    pub fn goto(&mut self, x: i32, y: i32, region: Region) {
        let wanted = region.layer();
        if self.layer != Some(wanted) {
            self.set_layer(wanted);
        }
        self.region = region;
        self.cursor = Cursor { x, y };
    }

    pub fn put_char(&mut self, ch: char) {
        if ch == '\n' {
            self.cursor.x = 1;
            self.cursor.y = self.cursor.y.saturating_add(1);
            return;
        }
        let (fg, bg, Cursor { x, y }) = (self.fg, self.bg, self.cursor);
        let region = self.region;
        self.area_mut(region).put_character(ch, fg, bg, x, y);
        self.cursor.x = self.cursor.x.saturating_add(1);
    }

    pub fn put_string(&mut self, s: &str) {
        for ch in s.chars() {
            self.put_char(ch);
        }
    }

    pub fn clear_region(&mut self) {
        let region = self.region;
        self.area_mut(region).clear();
    }

    pub fn set_fg(&mut self, color: u8) {
        self.fg = color;
    }

    pub fn set_bg(&mut self, color: u8) {
        self.bg = color;
    }

    pub fn resize_region(&mut self, region: Region, cols: i32, rows: i32) -> Result<(), RegionError> {
        if cols <= 0 || rows <= 0 {
            return Err(RegionError::NonPositive { cols, rows });
        }
        let max = self.max_region_cells;
        match (cols as usize).checked_mul(rows as usize) {
            Some(cells) if cells <= max => {}
            _ => return Err(RegionError::TooLarge { cols, rows, max }),
        }
        self.area_mut(region).resize(cols as usize, rows as usize);
        Ok(())
    }

    /// Back to a fresh session: default colors, cursor at the console
    /// origin, every region blank. Sizes and the visible layer stay.
    pub fn reset(&mut self) {
        self.fg = self.default_fg;
        self.bg = self.default_bg;
        self.region = Region::Crt;
        self.cursor = Cursor::default();
        self.crt.clear();
        self.stats.clear();
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn manager() -> TerminalManager {
        let mut t = TerminalManager::new(&TextConfig::default());
        t.set_layer(Layer::Crt);
        t
    }

    // ── set_layer ──

    #[test]
    fn starts_with_no_layer() {
        let t = TerminalManager::new(&TextConfig::default());
        assert_eq!(t.layer(), None);
        assert!(!t.panels().crt.is_visible());
    }

    #[test]
    fn crt_to_crt_clears_each_time() {
        let mut t = manager();
        for _ in 0..2 {
            t.goto(1, 1, Region::Crt);
            t.put_string("abc");
            assert!(!t.area(Region::Crt).is_blank());
            t.set_layer(Layer::Crt);
            assert!(t.area(Region::Crt).is_blank());
            let p = t.panels();
            assert_eq!(p.crt, Display::Block);
            assert!(!p.dungeon.is_visible());
            assert!(!p.stats.is_visible());
            assert!(!p.messages.is_visible());
        }
    }

    #[test]
    fn normal_to_crt_keeps_contents() {
        let mut t = manager();
        t.goto(1, 1, Region::Crt);
        t.put_string("abc");
        t.set_layer(Layer::Normal);
        t.set_layer(Layer::Crt);
        assert_eq!(t.area(Region::Crt).row_text(1), "abc");
    }

    #[test]
    fn none_to_crt_does_not_clear() {
        let mut t = TerminalManager::new(&TextConfig::default());
        t.crt.put_character('z', 7, 0, 1, 1);
        t.set_layer(Layer::Crt);
        assert_eq!(t.area(Region::Crt).row_text(1), "z");
    }

    #[test]
    fn normal_shows_stats_inline() {
        let mut t = manager();
        t.set_layer(Layer::Normal);
        assert_eq!(
            t.panels(),
            Panels {
                crt: Display::Hidden,
                dungeon: Display::Block,
                stats: Display::InlineBlock,
                messages: Display::Block,
            }
        );
    }

    // ── goto ──

    #[test]
    fn goto_pane_enters_normal_layer() {
        let mut t = manager();
        t.goto(3, 2, Region::Stat);
        assert_eq!(t.layer(), Some(Layer::Normal));
        assert_eq!(t.region(), Region::Stat);
        assert_eq!(t.cursor(), Cursor { x: 3, y: 2 });
    }

    #[test]
    fn goto_crt_while_on_crt_does_not_clear() {
        let mut t = manager();
        t.goto(1, 1, Region::Crt);
        t.put_string("keep");
        t.goto(1, 2, Region::Crt);
        assert_eq!(t.area(Region::Crt).row_text(1), "keep");
    }

    // ── text primitives ──

    #[test]
    fn newline_resets_column_and_advances_row() {
        let mut t = manager();
        t.goto(17, 4, Region::Crt);
        t.put_char('\n');
        assert_eq!(t.cursor(), Cursor { x: 1, y: 5 });
        assert!(t.area(Region::Crt).is_blank());
    }

    #[test]
    fn put_char_uses_current_colors() {
        let mut t = manager();
        t.set_fg(12);
        t.set_bg(4);
        t.goto(2, 1, Region::Crt);
        t.put_char('@');
        let cell = t.area(Region::Crt).get(2, 1).unwrap();
        assert_eq!((cell.ch, cell.fg, cell.bg), ('@', 12, 4));
    }

    #[test]
    fn text_goes_to_selected_region_only() {
        let mut t = manager();
        t.goto(1, 1, Region::Msg);
        t.put_string("You hit the rat.");
        assert_eq!(t.area(Region::Msg).row_text(1), "You hit the rat.");
        assert!(t.area(Region::Crt).is_blank());
        assert!(t.area(Region::Stat).is_blank());
    }

    #[test]
    fn clear_region_touches_only_active_region() {
        let mut t = manager();
        t.goto(1, 1, Region::Msg);
        t.put_string("msg");
        t.goto(1, 1, Region::Stat);
        t.put_string("HP 10");
        t.clear_region();
        assert!(t.area(Region::Stat).is_blank());
        assert_eq!(t.area(Region::Msg).row_text(1), "msg");
    }

    #[test]
    fn writing_past_the_edge_still_advances_cursor() {
        let mut t = manager();
        let cols = t.area(Region::Crt).cols() as i32;
        t.goto(cols, 1, Region::Crt);
        t.put_string("ab");
        assert_eq!(t.cursor().x, cols + 2);
        assert_eq!(t.area(Region::Crt).row_text(2), "");
    }

    #[test]
    fn resize_region_rejects_non_positive() {
        let mut t = manager();
        assert_eq!(
            t.resize_region(Region::Msg, 0, 5),
            Err(RegionError::NonPositive { cols: 0, rows: 5 })
        );
        t.resize_region(Region::Msg, 100, 7).unwrap();
        assert_eq!(t.area(Region::Msg).cols(), 100);
    }

    #[test]
    fn resize_region_rejects_oversized_grids() {
        let mut t = manager();
        let max = TextConfig::default().max_region_cells;
        assert_eq!(
            t.resize_region(Region::Crt, i32::MAX, i32::MAX),
            Err(RegionError::TooLarge { cols: i32::MAX, rows: i32::MAX, max })
        );
        assert_eq!(
            t.resize_region(Region::Crt, 100_000, 100_000),
            Err(RegionError::TooLarge { cols: 100_000, rows: 100_000, max })
        );
        assert_eq!(t.area(Region::Crt).cols(), 80);
    }

    #[test]
    fn cursor_saturates_at_the_far_edge() {
        let mut t = manager();
        t.goto(i32::MAX, i32::MAX, Region::Crt);
        t.put_string("ab");
        assert_eq!(t.cursor().x, i32::MAX);
        t.put_char('\n');
        assert_eq!(t.cursor(), Cursor { x: 1, y: i32::MAX });
        assert!(t.area(Region::Crt).is_blank());
    }

    #[test]
    fn reset_restores_defaults_and_blanks_regions() {
        let mut t = manager();
        t.set_fg(0);
        t.set_bg(0);
        t.goto(4, 2, Region::Stat);
        t.put_string("HP 3/20");
        t.goto(1, 1, Region::Msg);
        t.put_string("You die...");
        t.reset();
        assert_eq!(t.colors(), (16, 0));
        assert_eq!(t.region(), Region::Crt);
        assert_eq!(t.cursor(), Cursor::default());
        assert!(t.area(Region::Stat).is_blank());
        assert!(t.area(Region::Msg).is_blank());
    }

    proptest! {
        #[test]
        fn put_string_advances_column_by_len(
            x in 1i32..60,
            y in 1i32..20,
            s in "[a-zA-Z0-9 .,:#@]{0,40}",
        ) {
            let mut t = manager();
            t.goto(x, y, Region::Crt);
            t.put_string(&s);
            prop_assert_eq!(t.cursor(), Cursor { x: x + s.chars().count() as i32, y });
        }

        #[test]
        fn newline_always_lands_on_column_one(x in -5i32..200, y in -5i32..200) {
            let mut t = manager();
            t.goto(x, y, Region::Crt);
            t.put_char('\n');
            prop_assert_eq!(t.cursor(), Cursor { x: 1, y: y + 1 });
        }
    }
}
