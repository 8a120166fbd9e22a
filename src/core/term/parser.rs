//! VT sequence parser
//!
//! Interprets the inbound byte stream one byte at a time and updates
//! terminal state. Four states are enough for the VT100 subset handled
//! here: plain text, right after ESC, inside a one-byte non-CSI tail, and
//! inside a CSI sequence.

use tracing::{debug, trace};

use super::params::Params;
use super::state::TerminalState;

/// Longest parameter string accepted inside a CSI sequence.
pub const MAX_PARAM_LEN: usize = 48;

const BEL: u8 = 0x07;
const BS: u8 = 0x08;
const LF: u8 = 0x0A;
const VT: u8 = 0x0B;
const FF: u8 = 0x0C;
const CR: u8 = 0x0D;
const SO: u8 = 0x0E;
const SI: u8 = 0x0F;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

/// Parser state machine states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    /// ESC received
    GotEsc,
    /// `ESC %`, `ESC #`, `ESC (` or `ESC )`; the next byte is swallowed
    NonCsi,
    /// `ESC [` received, collecting parameters
    Csi,
}

/// Parser state machine
#[derive(Clone, Debug)]
pub struct VtParser {
    state: ParserState,
    params: Vec<u8>,
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Idle,
            params: Vec::with_capacity(MAX_PARAM_LEN),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Raw parameter bytes collected so far.
    pub fn pending_params(&self) -> &[u8] {
        &self.params
    }

    /// Drop any partial sequence.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.params.clear();
    }

    /// Feed a single byte to the parser
    pub fn feed(&mut self, byte: u8, state: &mut TerminalState) {
        if byte == 0 {
            return;
        }

        // CAN and SUB cancel a sequence in progress
        if self.state != ParserState::Idle && (byte == CAN || byte == SUB) {
            debug!("escape sequence cancelled in {:?}", self.state);
            self.reset();
            return;
        }

        match self.state {
            ParserState::Idle => self.idle(byte, state),
            ParserState::GotEsc => self.escape(byte, state),
            ParserState::NonCsi => {
                trace!("ignoring non-CSI parameter {:#04x}", byte);
                self.state = ParserState::Idle;
            }
            ParserState::Csi => self.csi(byte, state),
        }
    }

    fn idle(&mut self, byte: u8, state: &mut TerminalState) {
        match byte {
            BEL => {}
            BS => state.backspace(),
            LF | VT | FF => state.linefeed(),
            CR => state.move_to_line_start(),
            SO => state.set_alt_charset(true),
            SI => state.set_alt_charset(false),
            ESC => self.state = ParserState::GotEsc,
            DEL => {}
            0x20..=0xFF => state.put_char(byte),
            _ => {}
        }
    }

    fn escape(&mut self, byte: u8, state: &mut TerminalState) {
        self.state = ParserState::Idle;
        match byte {
            b'[' => {
                self.params.clear();
                self.state = ParserState::Csi;
            }
            // Sequences taking one more byte, which is not interpreted
            b'%' | b'#' | b'(' | b')' => self.state = ParserState::NonCsi,
            // DECSC - Save cursor
            b'7' => state.save(),
            // DECRC - Restore cursor
            b'8' => state.restore(),
            // IND - Index
            b'D' => state.index(),
            // NEL - Next line
            b'E' => {
                state.move_to_line_start();
                state.index();
            }
            // RI - Reverse index
            b'M' => state.reverse_index(),
            // RIS - Full reset
            b'c' => {
                state.reset();
                self.reset();
            }
            _ => debug!("unimplemented ESC {:?}", byte as char),
        }
    }

    fn csi(&mut self, byte: u8, state: &mut TerminalState) {
        match byte {
            b'0'..=b'9' | b';' | b'?' => {
                if self.params.len() >= MAX_PARAM_LEN {
                    debug!("CSI parameters exceed {} bytes, sequence dropped", MAX_PARAM_LEN);
                    self.reset();
                    return;
                }
                self.params.push(byte);
            }
            _ => {
                self.execute_csi(byte, state);
                self.reset();
            }
        }
    }

    fn execute_csi(&self, final_byte: u8, state: &mut TerminalState) {
        let mut params = Params::new(&self.params);

        match final_byte {
            // Cursor movement
            b'A' => state.move_by(0, -i32::from(params.get(1))),
            b'B' => state.move_by(0, i32::from(params.get(1))),
            b'C' => state.move_col(i32::from(params.get(1))),
            b'D' => state.move_col(-i32::from(params.get(1))),
            b'E' => {
                // CNL - Cursor Next Line
                state.move_by(0, i32::from(params.get(1)));
                state.move_to_line_start();
            }
            b'F' => {
                // CPL - Cursor Previous Line
                state.move_by(0, -i32::from(params.get(1)));
                state.move_to_line_start();
            }
            b'G' => {
                // CHA - Cursor Character Absolute
                state.set_col(i32::from(params.get(1)) - 1);
            }
            b'H' | b'f' => {
                // CUP - Cursor Position
                let row = i32::from(params.get(1));
                let col = i32::from(params.get(1));
                state.move_to(col - 1, row - 1);
            }

            // Erase
            b'J' => state.erase_in_display(params.get(0)),
            b'K' => state.erase_in_line(params.get(0)),

            // SGR - Select Graphic Rendition
            b'm' => {
                while let Some(code) = params.next(0) {
                    match code {
                        0 | 27 => state.set_reverse(false),
                        7 => state.set_reverse(true),
                        other => trace!("ignoring SGR {}", other),
                    }
                }
            }

            // Line operations
            b'L' => state.insert_lines(params.get(1)),
            b'M' => state.delete_lines(params.get(1)),

            // Character operations
            b'@' => state.insert_chars(params.get(1)),
            b'P' => state.delete_chars(params.get(1)),

            // Scroll
            b'S' => state.scroll_up(params.get(1)),
            b'T' => state.scroll_down(params.get(1)),

            // Scroll region
            b'r' => {
                let top = i32::from(params.get(1));
                let bottom = i32::from(params.get(state.rows()));
                state.set_margins(top - 1, bottom - 1);
            }

            _ => {
                // Unknown sequence
                debug!(
                    "unknown CSI: params={:?}, final={:?}",
                    String::from_utf8_lossy(&self.params),
                    final_byte as char
                );
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn feed_all(parser: &mut VtParser, state: &mut TerminalState, bytes: &[u8]) {
        for &b in bytes {
            parser.feed(b, state);
        }
    }

    proptest! {
        /// Arbitrary input never panics, and CAN always brings the parser
        /// back to idle.
        #[test]
        fn random_bytes_settle_after_can(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            let mut parser = VtParser::new();
            let mut state = TerminalState::default();
            feed_all(&mut parser, &mut state, &bytes);
            prop_assert!(state.cursor().col < state.cols());
            prop_assert!(state.cursor().row < state.rows());
            prop_assert!(state.top_margin() < state.bottom_margin());
            parser.feed(CAN, &mut state);
            prop_assert_eq!(parser.state(), ParserState::Idle);
        }

        /// CUP with any numbers lands inside the grid.
        #[test]
        fn cup_in_bounds(row in 0u32..100_000, col in 0u32..100_000) {
            let mut parser = VtParser::new();
            let mut state = TerminalState::default();
            feed_all(&mut parser, &mut state, format!("\x1b[{};{}H", row, col).as_bytes());
            let expected_row = (row.max(1) - 1).min(u32::from(state.rows()) - 1);
            let expected_col = (col.max(1) - 1).min(u32::from(state.cols()) - 1);
            prop_assert_eq!(
                state.cursor_pos(),
                (expected_col as u16, expected_row as u16)
            );
        }

        /// ESC c resets everything regardless of what came before.
        #[test]
        fn full_reset_is_idempotent(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
            let mut parser = VtParser::new();
            let mut state = TerminalState::default();
            feed_all(&mut parser, &mut state, &bytes);
            // leave any half-read sequence first
            parser.feed(CAN, &mut state);
            feed_all(&mut parser, &mut state, b"\x1bc");

            let fresh = TerminalState::default();
            prop_assert_eq!(parser.state(), ParserState::Idle);
            prop_assert_eq!(state.grid(), fresh.grid());
            prop_assert_eq!(state.cursor_pos(), (0, 0));
            prop_assert_eq!((state.top_margin(), state.bottom_margin()), (0, 24));
            prop_assert!(state.attrs().is_empty());
        }
    }
}
