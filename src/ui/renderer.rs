/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the session's visible surfaces into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout per layer:
///   crt     console grid from the top-left corner
///   normal  dungeon map (2 columns per map cell), stat pane to its
///           right, message pane below
/// The chat banner always takes the bottom row; an open chat panel
/// grows upwards from there.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::surface::TextArea;
use crate::domain::terminal::{Layer, Region};
use crate::domain::tiles::Sheet;
use crate::session::dispatch::Session;
use crate::ui::palette::Palette;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// cleared screen and drawn cells share one color.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::Grey,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn clear_row(&mut self, y: usize) {
        for x in 0..self.width {
            self.set(x, y, Cell::BLANK);
        }
    }

    /// Row as plain text, trailing blanks trimmed.
    pub fn row_text(&self, y: usize) -> String {
        let s: String = (0..self.width).map(|x| self.get(x, y).ch).collect();
        s.trim_end().to_string()
    }
}

// ── Composition (no I/O) ──

/// Each map cell = 2 terminal columns.
const MAP_CELL_W: usize = 2;
/// Log lines shown when the chat panel is open.
const CHAT_LOG_LINES: usize = 6;

pub fn compose(fb: &mut FrameBuffer, session: &Session, palette: &Palette) {
    fb.clear();
    let term = session.terminal();

    match term.layer() {
        Some(Layer::Crt) => compose_text(fb, term.area(Region::Crt), 0, 0, palette),
        Some(Layer::Normal) => {
            let (map_w, map_h) = compose_dungeon(fb, session);
            let stats = term.area(Region::Stat);
            let stat_x = if map_w > 0 { map_w + 1 } else { 0 };
            compose_text(fb, stats, stat_x, 0, palette);
            let msg_y = map_h.max(stats.rows()) + 1;
            compose_text(fb, term.area(Region::Msg), 0, msg_y, palette);
        }
        None => {}
    }

    compose_chat(fb, session);
}

fn compose_text(fb: &mut FrameBuffer, area: &TextArea, x0: usize, y0: usize, palette: &Palette) {
    for row in 0..area.rows() {
        for col in 0..area.cols() {
            if let Some(c) = area.get(col as i32 + 1, row as i32 + 1) {
                fb.set(x0 + col, y0 + row, Cell::new(c.ch, palette.color(c.fg), palette.background(c.bg)));
            }
        }
    }
}

/// Draw each cell's blit stack back to front; later blits cover earlier ones.
/// Returns the map's size in terminal cells.
fn compose_dungeon(fb: &mut FrameBuffer, session: &Session) -> (usize, usize) {
    let tiles = session.tiles();
    let Some(canvas) = tiles.canvas() else {
        return (0, 0);
    };
    let (cols, rows) = tiles.size();
    let source = tiles.source();

    for blit in canvas.blits() {
        let (cx, cy) = blit.cell;
        if cx < 0 || cy < 0 || cx >= cols || cy >= rows {
            continue;
        }
        let glyph = source
            .glyph(blit.sheet, blit.id)
            .unwrap_or_else(|| blit.sheet.fallback_glyph());
        let fg = match blit.sheet {
            Sheet::Dungeon => Color::DarkGrey,
            Sheet::Main => Color::Yellow,
            Sheet::Player => Color::White,
        };
        let col = cx as usize * MAP_CELL_W;
        fb.set(col, cy as usize, Cell::new(glyph, fg, Color::Reset));
        fb.set(col + 1, cy as usize, Cell::new(' ', fg, Color::Reset));
    }

    (cols as usize * MAP_CELL_W, rows as usize)
}

fn compose_chat(fb: &mut FrameBuffer, session: &Session) {
    if fb.height == 0 {
        return;
    }
    let chat = session.chat();
    let bottom = fb.height - 1;
    let banner_fg = if chat.has_new() { Color::Yellow } else { Color::DarkGrey };
    fb.clear_row(bottom);
    fb.put_str(0, bottom, chat.banner(), banner_fg, Color::Reset);

    if !chat.is_visible() {
        return;
    }

    let shown_end = chat.scroll().min(chat.log().len());
    let shown_start = shown_end.saturating_sub(CHAT_LOG_LINES);
    let lines = &chat.log()[shown_start..shown_end];

    // bottom-up: input, log, spectators
    let input_fg = if chat.input_focused() { Color::White } else { Color::DarkGrey };
    let mut rows: Vec<(String, Color)> = vec![(format!("> {}", chat.input()), input_fg)];
    rows.extend(lines.iter().rev().map(|l| (l.clone(), Color::Grey)));
    rows.push((
        format!("{}: {}", chat.spectator_line(), chat.spectator_names()),
        Color::Cyan,
    ));

    for (i, (text, fg)) in rows.iter().enumerate() {
        let Some(row) = bottom.checked_sub(i + 1) else {
            break;
        };
        fb.clear_row(row);
        fb.put_str(0, row, text, *fg, Color::Reset);
    }
}

/// Compose a frame of the given size and return it as plain text lines.
pub fn text_dump(session: &Session, w: usize, h: usize) -> String {
    let mut fb = FrameBuffer::new(w, h);
    compose(&mut fb, session, &Palette);
    let mut rows: Vec<String> = (0..h).map(|y| fb.row_text(y)).collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows.join("\n")
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    palette: Palette,
    last_layer: Option<Layer>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            palette: Palette,
            last_layer: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Layer change → full repaint for a clean transition
        let layer = session.terminal().layer();
        if self.last_layer != layer {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_layer = layer;
        }

        compose(&mut self.front, session, &self.palette);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::Grey;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Do NOT use ResetColor here: it resets to the terminal's native
        // default, which may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::domain::tiles::{SpriteInfo, TileTable};

    fn session() -> Session {
        let mut table = TileTable::new();
        let s = SpriteInfo { sx: 0, sy: 0, ex: 32, ey: 32, ox: 0, oy: 0 };
        table.insert(Sheet::Dungeon, 1, s);
        table.insert_glyph(Sheet::Dungeon, 1, '#');
        table.insert(Sheet::Main, 2, s);
        table.insert(Sheet::Player, 3, s);
        Session::new(&ClientConfig::default(), Box::new(table))
    }

    #[test]
    fn crt_layer_shows_console_text() {
        let mut s = session();
        s.handle_message(r#"{"op":"goto","x":3,"y":2}"#);
        s.handle_message(r#"{"op":"put_string","text":"Hallo Welt!"}"#);
        let dump = text_dump(&s, 40, 10);
        assert_eq!(dump.lines().nth(1), Some("  Hallo Welt!"));
    }

    #[test]
    fn later_blits_cover_earlier_ones() {
        let mut s = session();
        s.handle_message(r#"{"op":"set_layer","layer":"normal"}"#);
        s.handle_message(r#"{"op":"resize_viewport","cols":3,"rows":2}"#);
        s.handle_message(r#"{"op":"draw_cell","x":0,"y":0,"bg":1}"#);
        s.handle_message(r#"{"op":"draw_cell","x":1,"y":0,"bg":1,"fg":2}"#);
        s.handle_message(r#"{"op":"draw_cell","x":2,"y":0,"bg":1,"fg":2,"actors":[{"part":3}]}"#);
        let mut fb = FrameBuffer::new(40, 10);
        compose(&mut fb, &s, &Palette);
        assert_eq!(fb.row_text(0), "# * @");
        assert_eq!(fb.get(4, 0).fg, Color::White);
    }

    #[test]
    fn normal_layer_places_stats_right_of_map() {
        let mut s = session();
        s.handle_message(r#"{"op":"resize_viewport","cols":3,"rows":2}"#);
        s.handle_message(r#"{"op":"goto","x":1,"y":1,"region":"stat"}"#);
        s.handle_message(r#"{"op":"put_string","text":"HP 9/9"}"#);
        let mut fb = FrameBuffer::new(40, 20);
        compose(&mut fb, &s, &Palette);
        assert_eq!(fb.row_text(0), "       HP 9/9");
    }

    #[test]
    fn chat_banner_sits_on_bottom_row() {
        let mut s = session();
        s.handle_message(r#"{"op":"post_message","text":"hello"}"#);
        let mut fb = FrameBuffer::new(40, 10);
        compose(&mut fb, &s, &Palette);
        assert_eq!(fb.row_text(9), "1 new messages (Press _)");
    }

    #[test]
    fn open_chat_shows_log_above_input() {
        let mut s = session();
        s.handle_message(r#"{"op":"update_watchers","count":1,"names":"bob"}"#);
        s.handle_message(r#"{"op":"post_message","text":"bob: hi"}"#);
        s.handle_key(crossterm::event::KeyCode::Char('_'));
        let mut fb = FrameBuffer::new(40, 10);
        compose(&mut fb, &s, &Palette);
        assert_eq!(fb.row_text(9), "(Esc: back to game)");
        assert_eq!(fb.row_text(8), ">");
        assert_eq!(fb.row_text(7), "bob: hi");
        assert_eq!(fb.row_text(6), "1 spectators: bob");
    }
}
