//! Session management
//!
//! Ties the terminal state and parser to the host link: inbound bytes are
//! interpreted onto the grid, keystrokes are turned into outbound bytes,
//! and the setup screen takes over the keyboard while it is open.

use tracing::{debug, info};

use super::keys::{special_key_sequence, K_NUMLK};
use super::link::{LinkError, Transport};
use super::setup::{self, SetupOutcome, SetupScreen};
use super::term::{ParserState, TerminalState, VtParser, COLS, ROWS};
use crate::config::{Config, ConfigParam, NewlineMode};

/// A terminal session over one link
pub struct Session<T: Transport> {
    /// Terminal state
    pub state: TerminalState,
    /// VT parser
    parser: VtParser,
    transport: T,
    config: Config,
    /// Settings cached from the active profile
    newline: NewlineMode,
    local_echo: bool,
    process_escapes: bool,
    setup: Option<SetupScreen>,
}

impl<T: Transport> Session<T> {
    /// Create a new 80x25 session
    pub fn new(transport: T, config: Config) -> Self {
        Self::with_size(transport, config, COLS, ROWS)
    }

    pub fn with_size(transport: T, config: Config, cols: u16, rows: u16) -> Self {
        let mut session = Self {
            state: TerminalState::new(cols, rows),
            parser: VtParser::new(),
            transport,
            config,
            newline: NewlineMode::default(),
            local_echo: false,
            process_escapes: true,
            setup: None,
        };
        session.apply_config();
        session
    }

    /// Reset the terminal and show the welcome banner.
    pub fn start(&mut self) {
        self.setup = None;
        self.state.reset();
        self.parser.reset();
        self.apply_config();
        setup::draw_welcome(&mut self.state);
        self.state.newline();
        self.state.show_cursor();
        info!("session started");
    }

    /// Feed one inbound byte.
    pub fn process_byte(&mut self, byte: u8) {
        if byte == 0 {
            return;
        }
        if self.process_escapes {
            self.parser.feed(byte, &mut self.state);
        } else {
            self.state.put_raw(byte);
        }
    }

    /// Feed raw bytes into the terminal
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.process_byte(byte);
        }
    }

    /// Handle one logical keystroke.
    pub fn handle_key(&mut self, key: u8) -> Result<(), LinkError> {
        if let Some(screen) = self.setup.as_mut() {
            match screen.handle_key(key, &mut self.state) {
                SetupOutcome::Continue => {}
                SetupOutcome::Cancel => {
                    self.setup = None;
                    debug!("setup cancelled");
                    setup::draw_leave(&mut self.state, &self.config);
                }
                SetupOutcome::Save => {
                    if let Some(screen) = self.setup.take() {
                        screen.commit(&mut self.config);
                    }
                    self.apply_config();
                    setup::draw_leave(&mut self.state, &self.config);
                }
            }
            return Ok(());
        }

        match key {
            K_NUMLK => {
                debug!("entering setup");
                self.setup = Some(SetupScreen::start(&self.config, &mut self.state));
                Ok(())
            }
            b'\n' => self.send_all(self.newline.bytes()),
            0x80..=0xFF => match special_key_sequence(key) {
                Some(seq) => self.send_all(seq),
                None => {
                    debug!("no sequence for key {:#04x}", key);
                    Ok(())
                }
            },
            _ => self.send(key),
        }
    }

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        for &byte in bytes {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Send a byte to the host, echoing it locally when enabled.
    fn send(&mut self, byte: u8) -> Result<(), LinkError> {
        self.transport.send(byte)?;
        if self.local_echo {
            self.process_byte(byte);
        }
        Ok(())
    }

    /// Re-read the active profile.
    pub fn apply_config(&mut self) {
        let profile = *self.config.active();
        self.state.set_screen_reverse(profile.reverse_video);
        self.newline = profile.enter_sends;
        self.local_echo = profile.local_echo;
        self.process_escapes = profile.escape_sequences;
        info!(
            "profile {}: {} enter={} echo={} escapes={} reverse={}",
            self.config.active_profile + 1,
            profile,
            profile.get(ConfigParam::EnterSends),
            profile.get(ConfigParam::LocalEcho),
            profile.get(ConfigParam::EscapeSequences),
            profile.get(ConfigParam::ReverseVideo),
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if the setup screen is open
    pub fn in_setup(&self) -> bool {
        self.setup.is_some()
    }

    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Flush buffered outbound bytes.
    pub fn flush(&mut self) -> Result<(), LinkError> {
        self.transport.flush()
    }
}
