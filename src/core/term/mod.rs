//! VT100 terminal emulation.
//!
//! - **grid**: one-byte cells with a reverse-video bit
//! - **params**: CSI parameter extraction with per-position defaults
//! - **state**: cursor, margins and attributes over the grid
//! - **parser**: byte-at-a-time escape sequence state machine

pub mod grid;
pub mod params;
pub mod parser;
pub mod state;

pub use grid::{Grid, COLS, GLYPH_MASK, REVERSE_BIT, ROWS};
pub use params::Params;
pub use parser::{ParserState, VtParser, MAX_PARAM_LEN};
pub use state::{AttrFlags, CursorState, SavedState, TerminalState};
