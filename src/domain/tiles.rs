/// Tile renderer: composites sprites onto the dungeon canvas.
///
/// The canvas does not hold pixels. Each viewport cell keeps the stack
/// of blits that currently make it up, back to front; later blits cover
/// earlier ones, so the caller decides the layering (background, then
/// foreground, then actors). A background draw starts the cell over.
/// The presenter turns those stacks into terminal cells.
///
/// Sprite geometry comes from a `TileInfoSource`. Loading a real atlas
/// is someone else's job; `TileTable` and `UniformAtlas` are the two
/// providers that ship here.

use std::collections::HashMap;

use tracing::debug;

use crate::config::ViewportConfig;
use crate::error::{TileError, ViewportError};

// ── Sprite sheets and geometry ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sheet {
    /// Dungeon features: floors, walls (background layer).
    Dungeon,
    /// Items and monsters (foreground layer).
    Main,
    /// Player doll parts.
    Player,
}

impl Sheet {
    /// Glyph shown when the source offers no hint of its own.
    pub fn fallback_glyph(self) -> char {
        match self {
            Sheet::Dungeon => '.',
            Sheet::Main => '*',
            Sheet::Player => '@',
        }
    }
}

/// Source rectangle `(sx, sy)..(ex, ey)` plus a per-sprite draw offset.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SpriteInfo {
    pub sx: i32,
    pub sy: i32,
    pub ex: i32,
    pub ey: i32,
    pub ox: i32,
    pub oy: i32,
}

impl SpriteInfo {
    pub fn width(&self) -> i32 {
        self.ex.saturating_sub(self.sx)
    }

    pub fn height(&self) -> i32 {
        self.ey.saturating_sub(self.sy)
    }
}

pub trait TileInfoSource {
    fn sprite(&self, sheet: Sheet, id: u32) -> Option<SpriteInfo>;

    /// Optional terminal glyph for a sprite.
    fn glyph(&self, _sheet: Sheet, _id: u32) -> Option<char> {
        None
    }
}

/// Explicit lookup table.
#[derive(Default, Debug)]
pub struct TileTable {
    sprites: HashMap<(Sheet, u32), SpriteInfo>,
    glyphs: HashMap<(Sheet, u32), char>,
}

impl TileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet: Sheet, id: u32, info: SpriteInfo) {
        self.sprites.insert((sheet, id), info);
    }

    pub fn insert_glyph(&mut self, sheet: Sheet, id: u32, ch: char) {
        self.glyphs.insert((sheet, id), ch);
    }
}

impl TileInfoSource for TileTable {
    fn sprite(&self, sheet: Sheet, id: u32) -> Option<SpriteInfo> {
        self.sprites.get(&(sheet, id)).copied()
    }

    fn glyph(&self, sheet: Sheet, id: u32) -> Option<char> {
        self.glyphs.get(&(sheet, id)).copied()
    }
}

/// Every sheet laid out as a grid of same-size sprites, row-major.
#[derive(Clone, Copy, Debug)]
pub struct UniformAtlas {
    pub sprite_w: i32,
    pub sprite_h: i32,
    pub columns: u32,
}

impl TileInfoSource for UniformAtlas {
    fn sprite(&self, _sheet: Sheet, id: u32) -> Option<SpriteInfo> {
        if self.columns == 0 {
            return None;
        }
        let col = i32::try_from(id % self.columns).ok()?;
        let row = i32::try_from(id / self.columns).ok()?;
        let sx = col.checked_mul(self.sprite_w)?;
        let sy = row.checked_mul(self.sprite_h)?;
        Some(SpriteInfo {
            sx,
            sy,
            ex: sx.checked_add(self.sprite_w)?,
            ey: sy.checked_add(self.sprite_h)?,
            ox: 0,
            oy: 0,
        })
    }
}

// ── Canvas ──

/// One sprite copy onto the canvas.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Blit {
    pub sheet: Sheet,
    /// Base id after masking (part id for player sprites).
    pub id: u32,
    /// Cell the draw was issued for.
    pub cell: (i32, i32),
    pub src: SpriteInfo,
    pub dest_x: i32,
    pub dest_y: i32,
}

/// Most blits one cell keeps. Past that the oldest goes first.
pub const MAX_CELL_BLITS: usize = 16;

#[derive(Debug)]
pub struct Canvas {
    /// Changes on every reallocation.
    pub id: u64,
    pub width: i32,
    pub height: i32,
    cols: i32,
    rows: i32,
    cells: Vec<Vec<Blit>>,
}

impl Canvas {
    fn new(id: u64, cols: i32, rows: i32, width: i32, height: i32) -> Self {
        Canvas {
            id,
            width,
            height,
            cols,
            rows,
            cells: vec![Vec::new(); cols as usize * rows as usize],
        }
    }

    fn index(&self, cx: i32, cy: i32) -> Option<usize> {
        if cx < 0 || cy < 0 || cx >= self.cols || cy >= self.rows {
            return None;
        }
        Some(cy as usize * self.cols as usize + cx as usize)
    }

    /// One cell's stack, back to front. Empty off the canvas.
    pub fn cell(&self, cx: i32, cy: i32) -> &[Blit] {
        match self.index(cx, cy) {
            Some(i) => self.cells[i].as_slice(),
            None => &[],
        }
    }

    /// Every stored blit: cells in row-major order, each back to front.
    pub fn blits(&self) -> impl Iterator<Item = &Blit> + '_ {
        self.cells.iter().flatten()
    }

    fn push(&mut self, i: usize, blit: Blit) {
        let stack = &mut self.cells[i];
        if blit.sheet == Sheet::Dungeon {
            stack.clear();
        } else if stack.len() >= MAX_CELL_BLITS {
            stack.remove(0);
        }
        stack.push(blit);
    }
}

/// `cell * size + sprite_off + extra`, or `None` past the i32 range.
fn pixel(cell: i32, size: i32, sprite_off: i32, extra: i32) -> Option<i32> {
    cell.checked_mul(size)?.checked_add(sprite_off)?.checked_add(extra)
}

// ── TileRenderer ──

pub struct TileRenderer {
    cell_w: i32,
    cell_h: i32,
    flag_mask: u32,
    cols: i32,
    rows: i32,
    max_cells: usize,
    canvas: Option<Canvas>,
    allocations: u64,
    source: Box<dyn TileInfoSource>,
}

impl TileRenderer {
    pub fn new(cfg: &ViewportConfig, source: Box<dyn TileInfoSource>) -> Self {
        TileRenderer {
            cell_w: cfg.cell_width,
            cell_h: cfg.cell_height,
            flag_mask: cfg.tile_flag_mask,
            cols: 0,
            rows: 0,
            max_cells: cfg.max_viewport_cells,
            canvas: None,
            allocations: 0,
            source,
        }
    }

    pub fn size(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn source(&self) -> &dyn TileInfoSource {
        self.source.as_ref()
    }

    pub fn base_id(&self, tile: u32) -> u32 {
        tile & self.flag_mask
    }

    /// Reallocate the canvas for a `cols × rows` grid.
    /// Returns `Ok(false)` when the size is unchanged.
    pub fn resize_viewport(&mut self, cols: i32, rows: i32) -> Result<bool, ViewportError> {
        if cols == self.cols && rows == self.rows {
            return Ok(false);
        }
        if cols <= 0 || rows <= 0 {
            return Err(ViewportError::NonPositive { cols, rows });
        }
        let max = self.max_cells;
        match (cols as usize).checked_mul(rows as usize) {
            Some(cells) if cells <= max => {}
            _ => return Err(ViewportError::TooLarge { cols, rows, max }),
        }
        let (Some(width), Some(height)) = (cols.checked_mul(self.cell_w), rows.checked_mul(self.cell_h)) else {
            return Err(ViewportError::Overflow { cols, rows });
        };
        self.cols = cols;
        self.rows = rows;
        self.allocations += 1;
        let canvas = Canvas::new(self.allocations, cols, rows, width, height);
        debug!(cols, rows, width = canvas.width, height = canvas.height, "viewport reallocated");
        self.canvas = Some(canvas);
        Ok(true)
    }

    pub fn draw_background(&mut self, cx: i32, cy: i32, tile: u32) -> Result<(), TileError> {
        let id = self.base_id(tile);
        self.blit(Sheet::Dungeon, id, cx, cy, 0, 0)
    }

    pub fn draw_foreground(&mut self, cx: i32, cy: i32, tile: u32) -> Result<(), TileError> {
        let id = self.base_id(tile);
        self.blit(Sheet::Main, id, cx, cy, 0, 0)
    }

    pub fn draw_actor(&mut self, cx: i32, cy: i32, part: u32, dx: i32, dy: i32) -> Result<(), TileError> {
        self.blit(Sheet::Player, part, cx, cy, dx, dy)
    }

    fn blit(&mut self, sheet: Sheet, id: u32, cx: i32, cy: i32, dx: i32, dy: i32) -> Result<(), TileError> {
        let info = self
            .source
            .sprite(sheet, id)
            .ok_or(TileError::UnknownTile { sheet, id })?;
        let (cell_w, cell_h) = (self.cell_w, self.cell_h);
        let canvas = self.canvas.as_mut().ok_or(TileError::NoViewport)?;
        let i = canvas
            .index(cx, cy)
            .ok_or(TileError::OutsideViewport { x: cx, y: cy })?;
        let (Some(dest_x), Some(dest_y)) = (pixel(cx, cell_w, info.ox, dx), pixel(cy, cell_h, info.oy, dy)) else {
            return Err(TileError::Overflow { x: cx, y: cy });
        };
        canvas.push(
            i,
            Blit {
                sheet,
                id,
                cell: (cx, cy),
                src: info,
                dest_x,
                dest_y,
            },
        );
        Ok(())
    }

    /// Drop the canvas. The next `resize_viewport` allocates a new one
    /// with a fresh id, whatever size it asks for.
    pub fn reset(&mut self) {
        self.canvas = None;
        self.cols = 0;
        self.rows = 0;
    }
}
