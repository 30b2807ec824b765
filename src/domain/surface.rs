/// Text surfaces: the character grids behind the console, stat and
/// message regions.
///
/// Coordinates are 1-based, matching the cursor the server drives.
/// A write outside the grid (column or row 0 included) is dropped.

// ── TextCell ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextCell {
    pub ch: char,
    pub fg: u8,
    pub bg: u8,
}

impl TextCell {
    pub const BLANK: TextCell = TextCell { ch: ' ', fg: 7, bg: 0 };
}

impl Default for TextCell {
    fn default() -> Self {
        TextCell::BLANK
    }
}

// ── TextArea ──

#[derive(Clone, Debug)]
pub struct TextArea {
    cols: usize,
    rows: usize,
    cells: Vec<TextCell>,
}

impl TextArea {
    pub fn new(cols: usize, rows: usize) -> Self {
        TextArea {
            cols,
            rows,
            cells: vec![TextCell::BLANK; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Reallocate to a new size. Contents are discarded.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![TextCell::BLANK; cols * rows];
    }

    pub fn clear(&mut self) {
        self.cells.fill(TextCell::BLANK);
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.ch == ' ')
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 1 || y < 1 {
            return None;
        }
        let (cx, cy) = ((x - 1) as usize, (y - 1) as usize);
        if cx < self.cols && cy < self.rows {
            Some(cy * self.cols + cx)
        } else {
            None
        }
    }

    /// Store a character at 1-based (x, y). Returns false when off-grid.
    pub fn put_character(&mut self, ch: char, fg: u8, bg: u8, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = TextCell { ch, fg, bg };
                true
            }
            None => false,
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<TextCell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// One row as plain text, trailing blanks trimmed.
    pub fn row_text(&self, y: i32) -> String {
        if y < 1 || y as usize > self.rows {
            return String::new();
        }
        let start = (y as usize - 1) * self.cols;
        let s: String = self.cells[start..start + self.cols].iter().map(|c| c.ch).collect();
        s.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_character_is_one_based() {
        let mut area = TextArea::new(4, 2);
        assert!(area.put_character('x', 3, 1, 1, 1));
        assert_eq!(area.get(1, 1), Some(TextCell { ch: 'x', fg: 3, bg: 1 }));
        assert_eq!(area.row_text(1), "x");
    }

    #[test]
    fn writes_off_grid_are_dropped() {
        let mut area = TextArea::new(4, 2);
        assert!(!area.put_character('x', 7, 0, 0, 1));
        assert!(!area.put_character('x', 7, 0, 5, 1));
        assert!(!area.put_character('x', 7, 0, 1, 3));
        assert!(area.is_blank());
    }

    #[test]
    fn resize_discards_contents() {
        let mut area = TextArea::new(4, 2);
        area.put_character('x', 7, 0, 2, 2);
        area.resize(10, 3);
        assert_eq!((area.cols(), area.rows()), (10, 3));
        assert!(area.is_blank());
    }
}
