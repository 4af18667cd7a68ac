use super::cell::{Cell, Kind, Style};
use unicode_width::UnicodeWidthChar;

/// Drawing position. `y` counts up from the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grid of styled cells plus a text cursor.
#[derive(Clone, Debug)]
pub struct Buffer {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
    cursor: Pos,
}

impl Buffer {
    pub fn new(cols: usize, rows: usize, blank: &Cell) -> Self {
        Self { cols, rows, cells: vec![blank.clone(); cols * rows], cursor: Pos::default() }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell by terminal coordinates (row 0 at the top).
    pub fn at(&self, col: usize, row: usize) -> &Cell {
        &self.cells[row * self.cols + col]
    }

    fn offset(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.cols || pos.y as usize >= self.rows {
            return None;
        }
        let row = self.rows - 1 - pos.y as usize;
        Some(row * self.cols + pos.x as usize)
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.offset(pos).map(|i| &self.cells[i])
    }

    /// Overwrite every cell with `blank`, reusing glyph storage.
    pub fn fill(&mut self, blank: &Cell) {
        for cell in &mut self.cells {
            cell.clone_from(blank);
        }
        self.cursor = Pos::default();
    }

    /// Layer a cell onto `pos`.
    ///
    /// Lower `z` than the cell already there is dropped. Colors composite with
    /// the "over" operator; a space glyph over a non-opaque background keeps
    /// the glyph underneath.
    pub fn compose(&mut self, pos: Pos, z: i32, style: Style, glyph: &str) {
        let Some(i) = self.offset(pos) else {
            return;
        };
        if style.kind == Kind::Clear {
            return;
        }
        let cell = &mut self.cells[i];
        if cell.z > z {
            return;
        }

        cell.z = z;
        if style.kind == Kind::Default {
            cell.style = style;
            cell.glyph.clear();
            cell.glyph.push_str(glyph);
            return;
        }

        let keep_glyph = glyph == " " && !cell.glyph.is_empty() && style.bg.a != 255;
        cell.style = Style {
            kind: style.kind,
            attrs: style.attrs,
            fg: cell.style.fg.over(style.fg),
            bg: cell.style.bg.over(style.bg),
        };
        if !keep_glyph {
            cell.glyph.clear();
            cell.glyph.push_str(glyph);
        }
    }

    pub fn move_to(&mut self, pos: Pos) {
        self.cursor = pos;
    }

    fn next_line(&mut self) {
        self.cursor.x = 0;
        self.cursor.y = if self.cursor.y <= 0 { self.rows as i32 - 1 } else { self.cursor.y - 1 };
    }

    /// Write `text` at the cursor, advancing it. Wide glyphs take two cells;
    /// the cursor wraps to the start of the next line down.
    pub fn put(&mut self, text: &str, style: Style, z: i32) {
        if self.cols == 0 || self.rows == 0 {
            return;
        }
        let mut utf8 = [0u8; 4];
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if width == 2 && self.cursor.x + 1 >= self.cols as i32 {
                self.next_line();
            }

            let glyph = ch.encode_utf8(&mut utf8);
            self.compose(self.cursor, z, style, glyph);
            if width == 2 {
                self.compose(Pos::new(self.cursor.x + 1, self.cursor.y), z, style, "");
            }

            self.cursor.x += width as i32;
            if self.cursor.x >= self.cols as i32 {
                self.next_line();
            }
        }
    }

    /// Each row's glyphs, top row first.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|c| c.glyph.as_str()).collect())
    }
}
