//! Setup screen
//!
//! A full-screen menu drawn into the terminal grid for editing the two
//! line-setting profiles. Edits go to a scratch copy that is committed
//! only by the "Save" row.

use tracing::debug;

use super::keys::{K_DOWN, K_ESC, K_NUMLK, K_UP};
use super::term::TerminalState;
use crate::config::{Config, ConfigParam, Profile, PROFILE_COUNT};

/// Column where row labels start.
const NAME_COL: i32 = 3;
/// Width reserved for a label.
const NAME_WIDTH: i32 = 16;
/// Column where values start.
const VALUE_COL: i32 = NAME_COL + NAME_WIDTH + 3;
/// First screen row of the menu.
const FIRST_LINE: i32 = 2;

/// Menu rows: profile selector, one per parameter, then save.
const ROW_COUNT: usize = ConfigParam::ALL.len() + 2;
const SAVE_ROW: usize = ROW_COUNT - 1;

// Box-drawing glyphs
const HLINE: u8 = 0x12;
const VLINE: u8 = 0x19;
const TOP_LEFT: u8 = 0x0D;
const TOP_RIGHT: u8 = 0x0C;
const BOTTOM_LEFT: u8 = 0x0E;
const BOTTOM_RIGHT: u8 = 0x0B;

const HELP_TEXT: &[u8] = b"\x03\x04: select     Enter: change     Esc: quit";
const WELCOME_TEXT: &[u8] = b"Welcome to thinterm.";
const SUMMARY_HINT: &[u8] = b"(press NumLock to set)";

/// Result of a key press on the setup screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Stay on the setup screen.
    Continue,
    /// Leave, discarding edits.
    Cancel,
    /// Leave, keeping edits.
    Save,
}

/// Setup screen state
#[derive(Debug, Clone)]
pub struct SetupScreen {
    draft: Vec<Profile>,
    /// Profile being edited
    edited: usize,
    /// Profile in use when the screen opened
    active: usize,
    selected: usize,
}

impl SetupScreen {
    /// Open the setup screen over `term`.
    pub fn start(config: &Config, term: &mut TerminalState) -> Self {
        term.hide_cursor();
        let screen = Self {
            draft: config.profiles.clone(),
            edited: config.active_profile,
            active: config.active_profile,
            selected: 0,
        };
        screen.redraw(term);
        screen
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn edited_profile(&self) -> usize {
        self.edited
    }

    pub fn draft(&self) -> &[Profile] {
        &self.draft
    }

    pub fn handle_key(&mut self, key: u8, term: &mut TerminalState) -> SetupOutcome {
        match key {
            K_UP => {
                let old = self.selected;
                self.selected = old.checked_sub(1).unwrap_or(SAVE_ROW);
                self.draw_row(old, term);
                self.draw_row(self.selected, term);
            }
            K_DOWN => {
                let old = self.selected;
                self.selected = if old == SAVE_ROW { 0 } else { old + 1 };
                self.draw_row(old, term);
                self.draw_row(self.selected, term);
            }
            b'\n' => match self.selected {
                SAVE_ROW => return SetupOutcome::Save,
                0 => {
                    self.edited = (self.edited + 1) % PROFILE_COUNT;
                    self.redraw(term);
                }
                row => {
                    let param = ConfigParam::ALL[row - 1];
                    self.draft[self.edited].cycle(param);
                    debug!(
                        "profile {} {} -> {}",
                        self.edited + 1,
                        param.name(),
                        self.draft[self.edited].get(param)
                    );
                    self.draw_row(row, term);
                }
            },
            K_ESC | K_NUMLK => return SetupOutcome::Cancel,
            _ => {}
        }
        SetupOutcome::Continue
    }

    /// Write the edits into `config` and make the edited profile active.
    pub fn commit(self, config: &mut Config) {
        config.profiles = self.draft;
        config.active_profile = self.edited;
    }

    /// Draw the whole screen.
    pub fn redraw(&self, term: &mut TerminalState) {
        term.clear_screen();

        for row in 0..ROW_COUNT {
            self.draw_row(row, term);
        }

        let right = i32::from(term.cols()) - 1;
        let bottom = i32::from(term.rows()) - 1;
        draw_box(term, bottom);
        for y in 1..bottom {
            term.put_char_at(0, y, VLINE);
            term.put_char_at(right, y, VLINE);
        }

        term.put_str_at(5, bottom - 1, HELP_TEXT);
    }

    fn draw_row(&self, row: usize, term: &mut TerminalState) {
        let y = FIRST_LINE + 2 * row as i32;
        term.put_line(y, b"");

        match row {
            SAVE_ROW => term.put_str_at(NAME_COL, y, b"Save"),
            0 => {
                term.put_str_at(NAME_COL, y, b"Profile");
                term.put_char_at(VALUE_COL, y, b'1' + self.edited as u8);
                if self.edited == self.active {
                    term.put_str_at(VALUE_COL + 2, y, b"(active)");
                }
            }
            _ => {
                let param = ConfigParam::ALL[row - 1];
                term.put_str_at(NAME_COL, y, param.name().as_bytes());
                term.put_str_at(VALUE_COL, y, self.draft[self.edited].get(param).as_bytes());
            }
        }

        if row == self.selected {
            term.invert_range(2, y, term.cols().saturating_sub(4));
        }

        term.put_char_at(0, y, VLINE);
        term.put_char_at(i32::from(term.cols()) - 1, y, VLINE);
    }
}

/// Corners and horizontal edges of a box spanning the full width from row
/// 0 to row `bottom`.
fn draw_box(term: &mut TerminalState, bottom: i32) {
    let right = i32::from(term.cols()) - 1;
    for x in 1..right {
        term.put_char_at(x, 0, HLINE);
        term.put_char_at(x, bottom, HLINE);
    }
    term.put_char_at(0, 0, TOP_LEFT);
    term.put_char_at(right, 0, TOP_RIGHT);
    term.put_char_at(0, bottom, BOTTOM_LEFT);
    term.put_char_at(right, bottom, BOTTOM_RIGHT);
}

/// Clear the screen and draw the boxed banner. Leaves the cursor hidden
/// at the start of the row below the banner.
pub fn draw_welcome(term: &mut TerminalState) {
    term.clear_screen();
    draw_box(term, 2);
    term.put_char_at(0, 1, VLINE);
    term.put_char_at(i32::from(term.cols()) - 1, 1, VLINE);
    term.put_str_at(2, 1, WELCOME_TEXT);
    term.move_to(0, 3);
    term.hide_cursor();
}

/// One-line summary of the active profile at row `y`.
pub fn draw_summary(term: &mut TerminalState, config: &Config, y: i32) {
    let profile = config.active();
    term.put_char_at(0, y, b'1' + config.active_profile as u8);
    term.put_char_at(1, y, b']');

    let fields = [
        (3, ConfigParam::BaudRate),
        (9, ConfigParam::WordLength),
        (10, ConfigParam::Parity),
        (11, ConfigParam::StopBits),
        (13, ConfigParam::EnterSends),
    ];
    for (x, param) in fields {
        term.put_str_at(x, y, profile.get(param).as_bytes());
    }

    if profile.escape_sequences {
        term.put_str_at(18, y, b"ES");
    }
    if profile.local_echo {
        term.put_str_at(21, y, b"LE");
    }

    let hint_col = i32::from(term.cols()) - SUMMARY_HINT.len() as i32;
    term.put_str_at(hint_col, y, SUMMARY_HINT);
}

/// Screen shown after leaving setup: banner, summary, cursor on the next
/// line.
pub fn draw_leave(term: &mut TerminalState, config: &Config) {
    draw_welcome(term);
    let y = i32::from(term.cursor_pos().1);
    draw_summary(term, config, y);
    term.newline();
    term.show_cursor();
}
