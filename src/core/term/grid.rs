//! Character grid
//!
//! A fixed-size, row-major array of one-byte cells. The low seven bits of a
//! cell select a glyph from the display font, the high bit marks the cell as
//! drawn in reverse video.
//!
//! The grid trusts its callers: coordinates are clamped by [`TerminalState`]
//! before they reach this layer.
//!
//! [`TerminalState`]: super::TerminalState

/// Default grid width in cells.
pub const COLS: u16 = 80;
/// Default grid height in cells.
pub const ROWS: u16 = 25;

/// High bit of a cell: draw inverted.
pub const REVERSE_BIT: u8 = 0x80;
/// Glyph index bits of a cell.
pub const GLYPH_MASK: u8 = 0x7F;

/// Direction for [`Grid::shift_row`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    /// Open a gap at the column, dropping the last cell of the row.
    Right,
    /// Close the column, pulling the rest of the row left.
    Left,
}

/// Display grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<u8>,
    cols: u16,
    rows: u16,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(COLS, ROWS)
    }
}

impl Grid {
    /// Create a blank grid. Width is at least one cell and height at least
    /// two rows so a scroll region always exists.
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(2);
        Self {
            cells: vec![0; cols as usize * rows as usize],
            cols,
            rows,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Linear index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.cols as usize + x as usize
    }

    #[inline]
    pub fn write_cell(&mut self, x: u16, y: u16, cell: u8) {
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    #[inline]
    pub fn read_cell(&self, x: u16, y: u16) -> u8 {
        self.cells[self.index(x, y)]
    }

    /// Checked read for renderers.
    pub fn cell(&self, x: u16, y: u16) -> Option<u8> {
        if x < self.cols && y < self.rows {
            Some(self.read_cell(x, y))
        } else {
            None
        }
    }

    /// Flip the reverse-video bit of one cell.
    #[inline]
    pub fn toggle_reverse(&mut self, x: u16, y: u16) {
        let idx = self.index(x, y);
        self.cells[idx] ^= REVERSE_BIT;
    }

    /// Cells of one row.
    pub fn row(&self, y: u16) -> &[u8] {
        let start = self.index(0, y);
        &self.cells[start..start + self.cols as usize]
    }

    /// Iterate rows top to bottom.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.cols as usize)
    }

    /// Set `count` cells starting at linear index `start`.
    pub fn fill_range(&mut self, start: usize, count: usize, cell: u8) {
        self.cells[start..start + count].fill(cell);
    }

    pub fn fill_row(&mut self, y: u16, cell: u8) {
        let start = self.index(0, y);
        self.fill_range(start, self.cols as usize, cell);
    }

    pub fn fill(&mut self, cell: u8) {
        self.cells.fill(cell);
    }

    /// Copy `count` rows starting at `src` so they start at `dst`.
    /// Overlapping ranges are handled like `memmove`.
    pub fn move_rows(&mut self, src: u16, dst: u16, count: u16) {
        if count == 0 || src == dst {
            return;
        }
        let cols = self.cols as usize;
        let from = src as usize * cols;
        let len = count as usize * cols;
        self.cells.copy_within(from..from + len, dst as usize * cols);
    }

    /// Shift the tail of row `y` starting at column `x` one cell, writing
    /// `fill` into the freed cell.
    pub fn shift_row(&mut self, y: u16, x: u16, direction: Shift, fill: u8) {
        let start = self.index(x, y);
        let end = self.index(0, y) + self.cols as usize;
        match direction {
            Shift::Right => {
                self.cells.copy_within(start..end - 1, start + 1);
                self.cells[start] = fill;
            }
            Shift::Left => {
                self.cells.copy_within(start + 1..end, start);
                self.cells[end - 1] = fill;
            }
        }
    }

    /// Row contents as text for logs and tests: printable glyphs verbatim,
    /// everything else as a space.
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .iter()
            .map(|&cell| {
                let glyph = cell & GLYPH_MASK;
                if (0x20..0x7F).contains(&glyph) {
                    glyph as char
                } else {
                    ' '
                }
            })
            .collect()
    }
}
