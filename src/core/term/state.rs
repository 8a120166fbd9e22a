//! Terminal state management
//!
//! This module owns the display grid together with the cursor, the scroll
//! margins and the rendering attributes the parser mutates. Every public
//! operation clamps its coordinates before touching the grid.
//!
//! The cursor is never written into the grid. Renderers ask
//! [`TerminalState::display_cell`] for the cell as it should appear, with the
//! cursor drawn as an inverted cell on top of the stored content.

use bitflags::bitflags;

use super::grid::{Grid, Shift, COLS, REVERSE_BIT, ROWS};

bitflags! {
    /// Attributes applied to newly written characters.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        /// SGR 7: set the reverse-video bit on written cells.
        const REVERSE     = 0b01;
        /// SO/SI: remap `_`..=`~` onto the box-drawing glyphs.
        const ALT_CHARSET = 0b10;
    }
}

/// First byte remapped by the alternate character set.
const ALT_CHARSET_FIRST: u8 = b'_';
/// Last byte remapped by the alternate character set.
const ALT_CHARSET_LAST: u8 = b'~';
/// Distance from an alternate-set byte to its glyph index.
const ALT_CHARSET_OFFSET: u8 = 95;

/// Cursor state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorState {
    pub col: u16,
    pub row: u16,
    pub visible: bool,
    /// A character was written into the last column; the next printable
    /// character wraps before it is written.
    pub pending_wrap: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            visible: false,
            pending_wrap: false,
        }
    }
}

/// Snapshot taken by `ESC 7` and restored by `ESC 8`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedState {
    pub col: u16,
    pub row: u16,
    pub attrs: AttrFlags,
}

/// Terminal state holding the grid and everything positioned on it
#[derive(Clone, Debug)]
pub struct TerminalState {
    grid: Grid,
    cursor: CursorState,
    /// Scroll region (top, bottom) - 0-indexed, inclusive
    margins: (u16, u16),
    attrs: AttrFlags,
    saved: SavedState,
    /// Whole-screen reverse video: XOR-ed into every write and used as the
    /// blank fill.
    screen_reverse: bool,
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new(COLS, ROWS)
    }
}

impl TerminalState {
    pub fn new(cols: u16, rows: u16) -> Self {
        let grid = Grid::new(cols, rows);
        let bottom = grid.rows() - 1;
        Self {
            grid,
            cursor: CursorState::default(),
            margins: (0, bottom),
            attrs: AttrFlags::empty(),
            saved: SavedState::default(),
            screen_reverse: false,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Cursor as `(col, row)`.
    pub fn cursor_pos(&self) -> (u16, u16) {
        (self.cursor.col, self.cursor.row)
    }

    pub fn top_margin(&self) -> u16 {
        self.margins.0
    }

    pub fn bottom_margin(&self) -> u16 {
        self.margins.1
    }

    pub fn attrs(&self) -> AttrFlags {
        self.attrs
    }

    pub fn saved(&self) -> &SavedState {
        &self.saved
    }

    pub fn screen_reverse(&self) -> bool {
        self.screen_reverse
    }

    /// Cell as the renderer should draw it, cursor included.
    pub fn display_cell(&self, x: u16, y: u16) -> Option<u8> {
        let cell = self.grid.cell(x, y)?;
        if self.cursor.visible && (x, y) == self.cursor_pos() {
            Some(cell ^ REVERSE_BIT)
        } else {
            Some(cell)
        }
    }

    /// Value written into erased cells.
    fn blank(&self) -> u8 {
        if self.screen_reverse {
            REVERSE_BIT
        } else {
            0
        }
    }

    fn clamp_col(&self, x: i32) -> u16 {
        x.clamp(0, i32::from(self.cols()) - 1) as u16
    }

    fn clamp_row(&self, y: i32) -> u16 {
        y.clamp(0, i32::from(self.rows()) - 1) as u16
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn set_reverse(&mut self, on: bool) {
        self.attrs.set(AttrFlags::REVERSE, on);
    }

    pub fn set_alt_charset(&mut self, on: bool) {
        self.attrs.set(AttrFlags::ALT_CHARSET, on);
    }

    /// Whole-screen reverse video. Only affects cells written afterwards.
    pub fn set_screen_reverse(&mut self, on: bool) {
        self.screen_reverse = on;
    }

    pub fn show_cursor(&mut self) {
        self.cursor.visible = true;
    }

    pub fn hide_cursor(&mut self) {
        self.cursor.visible = false;
    }

    // ---------------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------------

    /// Write a printable byte at the cursor with the active attributes and
    /// advance the cursor.
    pub fn put_char(&mut self, byte: u8) {
        let mut glyph = byte;
        if self.attrs.contains(AttrFlags::ALT_CHARSET)
            && (ALT_CHARSET_FIRST..=ALT_CHARSET_LAST).contains(&glyph)
        {
            glyph -= ALT_CHARSET_OFFSET;
        }
        if self.attrs.contains(AttrFlags::REVERSE) {
            glyph |= REVERSE_BIT;
        }
        self.put_raw(glyph);
    }

    /// Write a cell value at the cursor without any interpretation and
    /// advance the cursor.
    pub fn put_raw(&mut self, cell: u8) {
        if self.cursor.pending_wrap {
            self.newline();
        }
        let (col, row) = self.cursor_pos();
        self.grid.write_cell(col, row, cell ^ self.blank());

        if col + 1 >= self.cols() {
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col += 1;
        }
    }

    /// Write a glyph at `(x, y)` without moving the cursor. Ignored when the
    /// position is off the grid.
    pub fn put_char_at(&mut self, x: i32, y: i32, glyph: u8) {
        if x < 0 || y < 0 || x >= i32::from(self.cols()) || y >= i32::from(self.rows()) {
            return;
        }
        let cell = glyph ^ self.blank();
        self.grid.write_cell(x as u16, y as u16, cell);
    }

    /// Write glyphs starting at `(x, y)`, truncated at the right edge.
    /// Ignored when the start is off the grid; the cursor does not move.
    pub fn put_str_at(&mut self, x: i32, y: i32, text: &[u8]) {
        if x < 0 || y < 0 || x >= i32::from(self.cols()) || y >= i32::from(self.rows()) {
            return;
        }
        let room = (i32::from(self.cols()) - x) as usize;
        for (i, &glyph) in text.iter().take(room).enumerate() {
            self.put_char_at(x + i as i32, y, glyph);
        }
    }

    /// Replace row `y` with `text`, blanking the rest of the row.
    pub fn put_line(&mut self, y: i32, text: &[u8]) {
        if y < 0 || y >= i32::from(self.rows()) {
            return;
        }
        let blank = self.blank();
        self.grid.fill_row(y as u16, blank);
        self.put_str_at(0, y, text);
    }

    /// Flip the reverse bit of `len` cells from `(x, y)`, stopping at the
    /// end of the row.
    pub fn invert_range(&mut self, x: i32, y: i32, len: u16) {
        if x < 0 || y < 0 || x >= i32::from(self.cols()) || y >= i32::from(self.rows()) {
            return;
        }
        let end = (x + i32::from(len)).min(i32::from(self.cols()));
        for col in x..end {
            self.grid.toggle_reverse(col as u16, y as u16);
        }
    }

    // ---------------------------------------------------------------------
    // Cursor movement
    // ---------------------------------------------------------------------

    /// Absolute move. Ignores the margins, clamps to the grid.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.cursor.col = self.clamp_col(x);
        self.cursor.row = self.clamp_row(y);
        self.cursor.pending_wrap = false;
    }

    /// Relative move. `dx` clamps to the grid width, the row always ends up
    /// inside the margins, even for `dy == 0`.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.cursor.col = self.clamp_col(i32::from(self.cursor.col) + dx);
        let (top, bottom) = self.margins;
        let row = (i32::from(self.cursor.row) + dy).clamp(i32::from(top), i32::from(bottom));
        self.cursor.row = row as u16;
        self.cursor.pending_wrap = false;
    }

    /// Horizontal relative move. Clamps to the grid width; the row is left
    /// alone.
    pub fn move_col(&mut self, dx: i32) {
        self.set_col(i32::from(self.cursor.col) + dx);
    }

    /// Set the column, keeping the row.
    pub fn set_col(&mut self, x: i32) {
        self.cursor.col = self.clamp_col(x);
        self.cursor.pending_wrap = false;
    }

    /// Carriage return - move cursor to column 0
    pub fn move_to_line_start(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// Line feed - move cursor down. Moving past the bottom margin, from
    /// inside or below the region, lands on the bottom margin and scrolls.
    pub fn linefeed(&mut self) {
        let bottom = self.margins.1;
        if self.cursor.row >= bottom {
            self.cursor.row = bottom;
            self.scroll_up(1);
        } else {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// Carriage return plus line feed.
    pub fn newline(&mut self) {
        self.move_to_line_start();
        self.linefeed();
    }

    /// Index - scroll up on the bottom margin, otherwise one row down
    /// clamped to the margins.
    pub fn index(&mut self) {
        if self.cursor.row == self.margins.1 {
            self.scroll_up(1);
            self.cursor.pending_wrap = false;
        } else {
            self.move_by(0, 1);
        }
    }

    /// Reverse index - scroll down on the top margin, otherwise one row up
    /// clamped to the margins.
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.margins.0 {
            self.scroll_down(1);
            self.cursor.pending_wrap = false;
        } else {
            self.move_by(0, -1);
        }
    }

    /// Backspace - move one cell left, wrapping to the end of the previous
    /// line. At the top of the screen the cursor lands on the first column
    /// of the top margin.
    pub fn backspace(&mut self) {
        if self.cursor.pending_wrap {
            self.cursor.pending_wrap = false;
        } else if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.cols() - 1;
        } else {
            self.cursor.row = self.margins.0;
        }
    }

    // ---------------------------------------------------------------------
    // Scrolling and line/character editing
    // ---------------------------------------------------------------------

    /// Scroll the margin region up by `n` lines, blanking the bottom.
    pub fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.margins;
        let blank = self.blank();
        for _ in 0..n.min(bottom - top + 1) {
            self.grid.move_rows(top + 1, top, bottom - top);
            self.grid.fill_row(bottom, blank);
        }
    }

    /// Scroll the margin region down by `n` lines, blanking the top.
    pub fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.margins;
        let blank = self.blank();
        for _ in 0..n.min(bottom - top + 1) {
            self.grid.move_rows(top, top + 1, bottom - top);
            self.grid.fill_row(top, blank);
        }
    }

    /// Insert blank lines at the cursor, pushing lines down to the bottom
    /// margin. No effect below the bottom margin.
    pub fn insert_lines(&mut self, n: u16) {
        let row = self.cursor.row;
        let bottom = self.margins.1;
        if row > bottom {
            return;
        }
        let blank = self.blank();
        for _ in 0..n.min(bottom - row + 1) {
            self.grid.move_rows(row, row + 1, bottom - row);
            self.grid.fill_row(row, blank);
        }
    }

    /// Delete lines at the cursor, pulling lines up from the bottom margin.
    /// No effect below the bottom margin.
    pub fn delete_lines(&mut self, n: u16) {
        let row = self.cursor.row;
        let bottom = self.margins.1;
        if row > bottom {
            return;
        }
        let blank = self.blank();
        for _ in 0..n.min(bottom - row + 1) {
            self.grid.move_rows(row + 1, row, bottom - row);
            self.grid.fill_row(bottom, blank);
        }
    }

    /// Insert blank cells at the cursor, pushing the rest of the row right.
    pub fn insert_chars(&mut self, n: u16) {
        let (col, row) = self.cursor_pos();
        let blank = self.blank();
        for _ in 0..n.min(self.cols() - col) {
            self.grid.shift_row(row, col, Shift::Right, blank);
        }
    }

    /// Delete cells at the cursor, pulling the rest of the row left.
    pub fn delete_chars(&mut self, n: u16) {
        let (col, row) = self.cursor_pos();
        let blank = self.blank();
        for _ in 0..n.min(self.cols() - col) {
            self.grid.shift_row(row, col, Shift::Left, blank);
        }
    }

    // ---------------------------------------------------------------------
    // Erasing
    // ---------------------------------------------------------------------

    /// Erase in display. Mode 0: cursor to end of screen, 1: start of
    /// screen to cursor (inclusive), 2: everything. Other modes are ignored.
    pub fn erase_in_display(&mut self, mode: u16) {
        let (col, row) = self.cursor_pos();
        let at = self.grid.index(col, row);
        let len = self.grid.len();
        let blank = self.blank();
        match mode {
            0 => self.grid.fill_range(at, len - at, blank),
            1 => self.grid.fill_range(0, at + 1, blank),
            2 => self.grid.fill(blank),
            _ => {}
        }
    }

    /// Erase in line. Same modes as [`erase_in_display`](Self::erase_in_display)
    /// limited to the cursor row.
    pub fn erase_in_line(&mut self, mode: u16) {
        let (col, row) = self.cursor_pos();
        let start = self.grid.index(0, row);
        let cols = self.cols() as usize;
        let blank = self.blank();
        match mode {
            0 => self.grid.fill_range(start + col as usize, cols - col as usize, blank),
            1 => self.grid.fill_range(start, col as usize + 1, blank),
            2 => self.grid.fill_row(row, blank),
            _ => {}
        }
    }

    /// Blank the cursor row and return to its first column.
    pub fn clear_line(&mut self) {
        let blank = self.blank();
        self.grid.fill_row(self.cursor.row, blank);
        self.move_to_line_start();
    }

    /// Blank the screen, reset the margins and home the cursor.
    pub fn clear_screen(&mut self) {
        self.reset_margins();
        let blank = self.blank();
        self.grid.fill(blank);
        self.move_to(0, 0);
    }

    // ---------------------------------------------------------------------
    // Margins
    // ---------------------------------------------------------------------

    /// Set the scroll region (0-indexed, inclusive) and move the cursor to
    /// the first column of the top margin, `(0, top)`, as DECSTBM homes. It
    /// deliberately does not land on column `top` of row 0, which a swapped
    /// goto would give. A negative top counts as row 0.
    /// A bottom past the last row, or an empty or inverted region, falls
    /// back to the full screen.
    pub fn set_margins(&mut self, top: i32, bottom: i32) {
        let last = i32::from(self.rows()) - 1;
        let top = top.max(0);
        self.margins = if bottom > last || top >= bottom {
            (0, last as u16)
        } else {
            (top as u16, bottom as u16)
        };
        self.move_to(0, i32::from(self.margins.0));
    }

    pub fn reset_margins(&mut self) {
        self.set_margins(0, i32::from(self.rows()) - 1);
    }

    // ---------------------------------------------------------------------
    // Save / restore / reset
    // ---------------------------------------------------------------------

    /// Save cursor position and attributes
    pub fn save(&mut self) {
        self.saved = SavedState {
            col: self.cursor.col,
            row: self.cursor.row,
            attrs: self.attrs,
        };
    }

    /// Restore cursor position and attributes
    pub fn restore(&mut self) {
        let saved = self.saved;
        self.move_to(i32::from(saved.col), i32::from(saved.row));
        self.attrs = saved.attrs;
    }

    /// Full reset: blank screen, full-screen margins, cursor home,
    /// attributes off, saved state set to the reset state.
    pub fn reset(&mut self) {
        self.clear_screen();
        self.attrs = AttrFlags::empty();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(state: &mut TerminalState, text: &[u8]) {
        for &b in text {
            state.put_char(b);
        }
    }

    #[test]
    fn test_put_char_advances_and_defers_wrap() {
        let mut state = TerminalState::new(4, 3);
        write(&mut state, b"abcd");
        assert_eq!(state.cursor_pos(), (3, 0));
        assert!(state.cursor().pending_wrap);
        write(&mut state, b"e");
        assert_eq!(state.grid().row_text(0), "abcd");
        assert_eq!(state.grid().row_text(1), "e   ");
        assert_eq!(state.cursor_pos(), (1, 1));
    }

    #[test]
    fn test_wrap_at_bottom_scrolls() {
        let mut state = TerminalState::new(2, 2);
        write(&mut state, b"abcde");
        assert_eq!(state.grid().row_text(0), "cd");
        assert_eq!(state.grid().row_text(1), "e ");
        assert_eq!(state.cursor_pos(), (1, 1));
    }

    #[test]
    fn test_alt_charset_and_reverse() {
        let mut state = TerminalState::new(10, 2);
        state.set_alt_charset(true);
        write(&mut state, b"qx^");
        state.set_alt_charset(false);
        state.set_reverse(true);
        write(&mut state, b"q");
        let row = state.grid().row(0);
        assert_eq!(row[0], b'q' - 95);
        assert_eq!(row[1], b'x' - 95);
        assert_eq!(row[2], b'^');
        assert_eq!(row[3], b'q' | REVERSE_BIT);
    }

    #[test]
    fn test_screen_reverse_xors_writes_and_fill() {
        let mut state = TerminalState::new(4, 2);
        state.set_screen_reverse(true);
        state.erase_in_display(2);
        state.put_char(b'a');
        state.set_reverse(true);
        state.put_char(b'b');
        let row = state.grid().row(0);
        assert_eq!(row[0], b'a' | REVERSE_BIT);
        assert_eq!(row[1], b'b');
        assert_eq!(row[2], REVERSE_BIT);
    }

    #[test]
    fn test_cursor_is_an_overlay() {
        let mut state = TerminalState::new(4, 2);
        state.put_char(b'a');
        state.move_to(0, 0);
        state.show_cursor();
        assert_eq!(state.grid().read_cell(0, 0), b'a');
        assert_eq!(state.display_cell(0, 0), Some(b'a' | REVERSE_BIT));
        assert_eq!(state.display_cell(1, 0), Some(0));
        state.hide_cursor();
        assert_eq!(state.display_cell(0, 0), Some(b'a'));
        assert_eq!(state.display_cell(4, 0), None);
    }

    #[test]
    fn test_move_to_ignores_margins_and_clamps() {
        let mut state = TerminalState::default();
        state.set_margins(5, 10);
        state.move_to(100, 100);
        assert_eq!(state.cursor_pos(), (79, 24));
        state.move_to(-3, -7);
        assert_eq!(state.cursor_pos(), (0, 0));
    }

    #[test]
    fn test_move_by_respects_margins() {
        let mut state = TerminalState::default();
        state.set_margins(5, 10);
        state.move_to(3, 7);
        state.move_by(0, -20);
        assert_eq!(state.cursor_pos(), (3, 5));
        state.move_by(0, 20);
        assert_eq!(state.cursor_pos(), (3, 10));
        state.move_by(200, 0);
        assert_eq!(state.cursor_pos(), (79, 10));
        state.move_by(-200, 0);
        assert_eq!(state.cursor_pos(), (0, 10));
    }

    #[test]
    fn test_set_margins_validation() {
        let mut state = TerminalState::default();
        state.set_margins(3, 8);
        assert_eq!((state.top_margin(), state.bottom_margin()), (3, 8));
        assert_eq!(state.cursor_pos(), (0, 3));

        state.set_margins(8, 3);
        assert_eq!((state.top_margin(), state.bottom_margin()), (0, 24));

        state.set_margins(-4, 99);
        assert_eq!((state.top_margin(), state.bottom_margin()), (0, 24));

        state.set_margins(4, 4);
        assert_eq!((state.top_margin(), state.bottom_margin()), (0, 24));
    }

    #[test]
    fn test_linefeed_scrolls_only_margin_region() {
        let mut state = TerminalState::new(3, 5);
        for y in 0..5 {
            state.put_char_at(0, y, b'0' + y as u8);
        }
        state.set_margins(1, 3);
        state.move_to(0, 3);
        state.linefeed();
        assert_eq!(state.cursor_pos(), (0, 3));
        let col0: Vec<u8> = (0..5).map(|y| state.grid().read_cell(0, y)).collect();
        assert_eq!(col0, vec![b'0', b'2', b'3', 0, b'4']);
    }

    #[test]
    fn test_linefeed_below_region_returns_to_bottom_margin() {
        let mut state = TerminalState::new(3, 5);
        for y in 0..5 {
            state.put_char_at(0, y, b'0' + y as u8);
        }
        state.set_margins(0, 2);
        state.move_to(0, 3);
        state.linefeed();
        assert_eq!(state.cursor_pos(), (0, 2));
        let col0: Vec<u8> = (0..5).map(|y| state.grid().read_cell(0, y)).collect();
        assert_eq!(col0, vec![b'1', b'2', 0, b'3', b'4']);
    }

    #[test]
    fn test_index_and_reverse_index_clamp_to_margins() {
        let mut state = TerminalState::new(3, 6);
        state.put_char_at(0, 1, b'x');
        state.set_margins(1, 3);

        state.move_to(0, 5);
        state.index();
        assert_eq!(state.cursor_pos(), (0, 3));
        assert_eq!(state.grid().read_cell(0, 1), b'x');

        state.move_to(0, 5);
        state.reverse_index();
        assert_eq!(state.cursor_pos(), (0, 3));

        state.move_to(0, 0);
        state.index();
        assert_eq!(state.cursor_pos(), (0, 1));
        assert_eq!(state.grid().read_cell(0, 1), b'x');
    }

    #[test]
    fn test_zero_move_snaps_into_margins() {
        let mut state = TerminalState::default();
        state.set_margins(4, 19);
        state.move_to(7, 23);
        state.move_by(0, 0);
        assert_eq!(state.cursor_pos(), (7, 19));

        state.move_to(7, 23);
        state.move_col(5);
        assert_eq!(state.cursor_pos(), (12, 23));
        state.move_col(-100);
        assert_eq!(state.cursor_pos(), (0, 23));
    }

    #[test]
    fn test_clear_line_uses_blank_fill() {
        let mut state = TerminalState::new(4, 2);
        state.put_str_at(0, 0, b"abcd");
        state.put_str_at(0, 1, b"wxyz");
        state.set_screen_reverse(true);
        state.move_to(2, 1);
        state.clear_line();
        assert_eq!(state.cursor_pos(), (0, 1));
        assert!(state.grid().row(1).iter().all(|&c| c == REVERSE_BIT));
        assert_eq!(state.grid().row(0), b"abcd");
    }

    #[test]
    fn test_reverse_index_at_top_scrolls_down() {
        let mut state = TerminalState::new(3, 4);
        state.put_char_at(0, 0, b'a');
        state.put_char_at(0, 1, b'b');
        state.reverse_index();
        assert_eq!(state.cursor_pos(), (0, 0));
        assert_eq!(state.grid().read_cell(0, 0), 0);
        assert_eq!(state.grid().read_cell(0, 1), b'a');
        assert_eq!(state.grid().read_cell(0, 2), b'b');
    }

    #[test]
    fn test_backspace_wraps_to_previous_line() {
        let mut state = TerminalState::new(5, 3);
        state.move_to(0, 2);
        state.backspace();
        assert_eq!(state.cursor_pos(), (4, 1));
        state.move_to(0, 0);
        state.backspace();
        assert_eq!(state.cursor_pos(), (0, 0));
    }

    #[test]
    fn test_backspace_clears_pending_wrap() {
        let mut state = TerminalState::new(3, 2);
        write(&mut state, b"abc");
        state.backspace();
        assert_eq!(state.cursor_pos(), (2, 0));
        state.put_char(b'Z');
        assert_eq!(state.grid().row_text(0), "abZ");
    }

    #[test]
    fn test_insert_and_delete_lines_within_margins() {
        let mut state = TerminalState::new(2, 5);
        for y in 0..5 {
            state.put_char_at(0, y, b'a' + y as u8);
        }
        state.set_margins(0, 3);
        state.move_to(0, 1);
        state.insert_lines(1);
        let col0: Vec<u8> = (0..5).map(|y| state.grid().read_cell(0, y)).collect();
        assert_eq!(col0, vec![b'a', 0, b'b', b'c', b'e']);

        state.delete_lines(2);
        let col0: Vec<u8> = (0..5).map(|y| state.grid().read_cell(0, y)).collect();
        assert_eq!(col0, vec![b'a', b'c', 0, 0, b'e']);
    }

    #[test]
    fn test_line_ops_below_margin_are_ignored() {
        let mut state = TerminalState::new(2, 5);
        state.put_char_at(0, 4, b'z');
        state.set_margins(0, 2);
        state.move_to(0, 4);
        state.insert_lines(1);
        state.delete_lines(1);
        assert_eq!(state.grid().read_cell(0, 4), b'z');
    }

    #[test]
    fn test_huge_counts_saturate() {
        let mut state = TerminalState::new(4, 3);
        write(&mut state, b"abcd");
        state.move_to(1, 0);
        state.delete_chars(u16::MAX);
        assert_eq!(state.grid().row(0), &[b'a', 0, 0, 0]);
        state.scroll_up(u16::MAX);
        assert!(state.grid().rows_iter().all(|r| r.iter().all(|&c| c == 0)));
    }

    #[test]
    fn test_erase_in_display_modes() {
        let mut state = TerminalState::new(3, 3);
        for y in 0..3 {
            state.put_str_at(0, y, b"XXX");
        }
        state.move_to(1, 1);
        state.erase_in_display(0);
        assert_eq!(state.grid().row_text(0), "XXX");
        assert_eq!(state.grid().row_text(1), "X  ");
        assert_eq!(state.grid().row_text(2), "   ");

        for y in 0..3 {
            state.put_str_at(0, y, b"XXX");
        }
        state.erase_in_display(1);
        assert_eq!(state.grid().row_text(0), "   ");
        assert_eq!(state.grid().row_text(1), "  X");
        assert_eq!(state.grid().row_text(2), "XXX");

        state.erase_in_display(9);
        assert_eq!(state.grid().row_text(2), "XXX");
        state.erase_in_display(2);
        assert_eq!(state.grid().row_text(2), "   ");
    }

    #[test]
    fn test_erase_in_line_modes() {
        let mut state = TerminalState::new(5, 2);
        state.put_str_at(0, 0, b"XXXXX");
        state.move_to(2, 0);
        state.erase_in_line(1);
        assert_eq!(state.grid().row_text(0), "   XX");
        state.erase_in_line(2);
        assert_eq!(state.grid().row_text(0), "     ");
    }

    #[test]
    fn test_put_str_at_truncates_and_ignores_offscreen() {
        let mut state = TerminalState::new(5, 2);
        state.put_str_at(3, 0, b"hello");
        assert_eq!(state.grid().row_text(0), "   he");
        state.put_str_at(-1, 0, b"zz");
        state.put_str_at(0, 2, b"zz");
        assert_eq!(state.grid().row_text(0), "   he");
        assert_eq!(state.cursor_pos(), (0, 0));
    }

    #[test]
    fn test_put_line_and_invert_range() {
        let mut state = TerminalState::new(6, 2);
        state.put_str_at(0, 1, b"garbage");
        state.put_line(1, b"ok");
        assert_eq!(state.grid().row_text(1), "ok    ");
        state.invert_range(1, 1, 100);
        let row = state.grid().row(1);
        assert_eq!(row[0], b'o');
        assert_eq!(row[1], b'k' | REVERSE_BIT);
        assert_eq!(row[5], REVERSE_BIT);
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut state = TerminalState::default();
        state.move_to(12, 7);
        state.set_reverse(true);
        state.set_alt_charset(true);
        state.save();

        state.move_to(0, 0);
        state.set_reverse(false);
        state.set_alt_charset(false);
        state.restore();

        assert_eq!(state.cursor_pos(), (12, 7));
        assert_eq!(state.attrs(), AttrFlags::REVERSE | AttrFlags::ALT_CHARSET);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = TerminalState::default();
        write(&mut state, b"junk");
        state.set_margins(2, 9);
        state.set_reverse(true);
        state.move_to(40, 12);
        state.reset();
        assert_eq!(state.cursor_pos(), (0, 0));
        assert_eq!((state.top_margin(), state.bottom_margin()), (0, 24));
        assert_eq!(state.attrs(), AttrFlags::empty());
        assert_eq!(*state.saved(), SavedState::default());
        assert!(state.grid().rows_iter().all(|r| r.iter().all(|&c| c == 0)));
    }
}
