//! Terminal renderer using crossterm
//!
//! Draws the emulated grid onto the host console. Each cell's glyph index
//! is mapped to a character through the display font table; the reverse
//! bit becomes the host's reverse-video attribute.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::core::term::{TerminalState, GLYPH_MASK, REVERSE_BIT};

/// Characters for glyph indices below 0x20: the line-drawing set reached
/// through SO, plus the two arrows used by the setup screen help line.
const LOW_GLYPHS: [char; 32] = [
    ' ', '◆', '▒', '↑', '↓', '␍', '␊', '°', '±', '␤', '␋', '┘', '┐', '┌', '└', '┼',
    '⎺', '⎻', '─', '⎼', '⎽', '├', '┤', '┴', '┬', '│', '≤', '≥', 'π', '≠', '£', '·',
];

/// Host character for a cell, ignoring its reverse bit.
pub fn glyph_char(cell: u8) -> char {
    let glyph = cell & GLYPH_MASK;
    match glyph {
        0x00..=0x1F => LOW_GLYPHS[glyph as usize],
        0x7F => ' ',
        _ => glyph as char,
    }
}

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Rows as last drawn, for skipping unchanged lines
    prev_rows: Vec<Vec<u8>>,
    /// Host console size
    size: (u16, u16),
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            prev_rows: Vec::new(),
            size: (0, 0),
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;

        self.size = terminal::size()?;
        self.prev_rows.clear();
        self.initialized = true;
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Host console was resized; redraw everything next frame.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
        self.prev_rows.clear();
        let _ = execute!(io::stdout(), Clear(ClearType::All));
    }

    /// Render the terminal state
    pub fn render(&mut self, state: &TerminalState) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(16384, stdout.lock());

        let rows = state.rows().min(self.size.1);
        let cols = state.cols().min(self.size.0);
        self.prev_rows.resize(state.rows() as usize, Vec::new());

        for y in 0..rows {
            let line: Vec<u8> = (0..cols)
                .map(|x| state.display_cell(x, y).unwrap_or(0))
                .collect();
            if self.prev_rows[y as usize] == line {
                continue;
            }
            queue!(out, MoveTo(0, y))?;
            write_row(&mut out, &line)?;
            self.prev_rows[y as usize] = line;
        }

        out.flush()
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

/// Write one row of cells, switching reverse video only at run boundaries.
fn write_row<W: Write>(out: &mut W, cells: &[u8]) -> io::Result<()> {
    let mut text = String::with_capacity(cells.len() * 3);
    let mut reversed = false;

    queue!(out, SetAttribute(Attribute::Reset))?;
    for &cell in cells {
        let reverse = cell & REVERSE_BIT != 0;
        if reverse != reversed {
            if !text.is_empty() {
                queue!(out, Print(&text))?;
                text.clear();
            }
            let attr = if reverse {
                Attribute::Reverse
            } else {
                Attribute::NoReverse
            };
            queue!(out, SetAttribute(attr))?;
            reversed = reverse;
        }
        text.push(glyph_char(cell));
    }
    if !text.is_empty() {
        queue!(out, Print(&text))?;
    }
    queue!(out, SetAttribute(Attribute::Reset))
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Simple debug renderer that outputs to a string
pub struct DebugRenderer;

impl DebugRenderer {
    /// Render state to string (for debugging)
    pub fn render(state: &TerminalState) -> String {
        let cursor = state.cursor();
        let mut output = String::new();

        output.push_str(&format!("=== Terminal {}x{} ===\n", state.cols(), state.rows()));
        output.push_str(&format!(
            "Cursor: ({}, {}) visible={}\n",
            cursor.col, cursor.row, cursor.visible
        ));
        output.push_str(&format!(
            "Margins: {}-{}\n",
            state.top_margin(),
            state.bottom_margin()
        ));
        output.push_str("─".repeat(state.cols() as usize).as_str());
        output.push('\n');

        for (y, row) in state.grid().rows_iter().enumerate() {
            // Row indicator
            let indicator = if y == cursor.row as usize { '>' } else { ' ' };
            output.push(indicator);

            for (x, &cell) in row.iter().enumerate() {
                let ch = if cursor.visible && y == cursor.row as usize && x == cursor.col as usize {
                    '█'
                } else {
                    glyph_char(cell)
                };
                output.push(ch);
            }

            output.push('\n');
        }

        output.push_str("─".repeat(state.cols() as usize).as_str());
        output.push('\n');

        output
    }
}
