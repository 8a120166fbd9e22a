//! Configuration for thinterm.
//!
//! Settings are read from `~/.thinterm/config.toml` (or a path given on the
//! command line). Two profiles hold the line settings; one of them is
//! active at a time and can be switched from the setup screen.
//!
//! # Configuration File
//!
//! ```toml
//! active_profile = 0
//!
//! [[profiles]]
//! baud_rate = 57600
//! word_length = 8
//! parity = "none"        # none, even, odd
//! stop_bits = 1
//! enter_sends = "cr"     # cr, lf, crlf
//! local_echo = false
//! escape_sequences = true
//! reverse_video = false
//!
//! [[profiles]]
//! baud_rate = 9600
//! enter_sends = "crlf"
//! ```
//!
//! Missing keys take their defaults. A missing file yields the default
//! configuration.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Number of stored profiles.
pub const PROFILE_COUNT: usize = 2;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Profile {0} does not exist")]
    UnknownProfile(usize),
}

/// Line speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B4800,
    B9600,
    B19200,
    B38400,
    #[default]
    B57600,
}

impl BaudRate {
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
    ];

    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|rate| rate.bits_per_second() == value)
            .ok_or_else(|| format!("unsupported baud rate {}", value))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bits_per_second()
    }
}

/// Data bits per character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WordLength {
    #[default]
    Eight,
    Nine,
}

impl TryFrom<u8> for WordLength {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(WordLength::Eight),
            9 => Ok(WordLength::Nine),
            other => Err(format!("unsupported word length {}", other)),
        }
    }
}

impl From<WordLength> for u8 {
    fn from(len: WordLength) -> Self {
        match len {
            WordLength::Eight => 8,
            WordLength::Nine => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl TryFrom<u8> for StopBits {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(format!("unsupported stop bits {}", other)),
        }
    }
}

impl From<StopBits> for u8 {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// What the Enter key sends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlineMode {
    #[default]
    Cr,
    Lf,
    CrLf,
}

impl NewlineMode {
    pub fn bytes(self) -> &'static [u8] {
        match self {
            NewlineMode::Cr => b"\r",
            NewlineMode::Lf => b"\n",
            NewlineMode::CrLf => b"\r\n",
        }
    }
}

/// One set of line and display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub baud_rate: BaudRate,
    pub word_length: WordLength,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub enter_sends: NewlineMode,
    pub local_echo: bool,
    pub escape_sequences: bool,
    pub reverse_video: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::default(),
            word_length: WordLength::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            enter_sends: NewlineMode::default(),
            local_echo: false,
            escape_sequences: true,
            reverse_video: false,
        }
    }
}

impl Profile {
    pub fn get(&self, param: ConfigParam) -> &'static str {
        param.value_str(self)
    }

    /// Step `param` to its next value, wrapping around.
    pub fn cycle(&mut self, param: ConfigParam) {
        match param {
            ConfigParam::BaudRate => {
                self.baud_rate = match self.baud_rate {
                    BaudRate::B4800 => BaudRate::B9600,
                    BaudRate::B9600 => BaudRate::B19200,
                    BaudRate::B19200 => BaudRate::B38400,
                    BaudRate::B38400 => BaudRate::B57600,
                    BaudRate::B57600 => BaudRate::B4800,
                }
            }
            ConfigParam::WordLength => {
                self.word_length = match self.word_length {
                    WordLength::Eight => WordLength::Nine,
                    WordLength::Nine => WordLength::Eight,
                }
            }
            ConfigParam::Parity => {
                self.parity = match self.parity {
                    Parity::None => Parity::Even,
                    Parity::Even => Parity::Odd,
                    Parity::Odd => Parity::None,
                }
            }
            ConfigParam::StopBits => {
                self.stop_bits = match self.stop_bits {
                    StopBits::One => StopBits::Two,
                    StopBits::Two => StopBits::One,
                }
            }
            ConfigParam::EnterSends => {
                self.enter_sends = match self.enter_sends {
                    NewlineMode::Cr => NewlineMode::Lf,
                    NewlineMode::Lf => NewlineMode::CrLf,
                    NewlineMode::CrLf => NewlineMode::Cr,
                }
            }
            ConfigParam::LocalEcho => self.local_echo = !self.local_echo,
            ConfigParam::EscapeSequences => self.escape_sequences = !self.escape_sequences,
            ConfigParam::ReverseVideo => self.reverse_video = !self.reverse_video,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}",
            self.get(ConfigParam::BaudRate),
            self.get(ConfigParam::WordLength),
            self.get(ConfigParam::Parity),
            self.get(ConfigParam::StopBits),
        )
    }
}

/// Settings shown on the setup screen, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigParam {
    BaudRate,
    WordLength,
    Parity,
    StopBits,
    EnterSends,
    LocalEcho,
    EscapeSequences,
    ReverseVideo,
}

impl ConfigParam {
    pub const ALL: [ConfigParam; 8] = [
        ConfigParam::BaudRate,
        ConfigParam::WordLength,
        ConfigParam::Parity,
        ConfigParam::StopBits,
        ConfigParam::EnterSends,
        ConfigParam::LocalEcho,
        ConfigParam::EscapeSequences,
        ConfigParam::ReverseVideo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigParam::BaudRate => "Baud rate",
            ConfigParam::WordLength => "Word Length",
            ConfigParam::Parity => "Parity",
            ConfigParam::StopBits => "Stop bits",
            ConfigParam::EnterSends => "Enter sends",
            ConfigParam::LocalEcho => "Local echo",
            ConfigParam::EscapeSequences => "Escape sequences",
            ConfigParam::ReverseVideo => "Reverse video",
        }
    }

    pub fn value_str(self, profile: &Profile) -> &'static str {
        fn on_off(on: bool) -> &'static str {
            if on {
                "On"
            } else {
                "Off"
            }
        }

        match self {
            ConfigParam::BaudRate => match profile.baud_rate {
                BaudRate::B4800 => "4800",
                BaudRate::B9600 => "9600",
                BaudRate::B19200 => "19200",
                BaudRate::B38400 => "38400",
                BaudRate::B57600 => "57600",
            },
            ConfigParam::WordLength => match profile.word_length {
                WordLength::Eight => "8",
                WordLength::Nine => "9",
            },
            ConfigParam::Parity => match profile.parity {
                Parity::None => "N",
                Parity::Even => "E",
                Parity::Odd => "O",
            },
            ConfigParam::StopBits => match profile.stop_bits {
                StopBits::One => "1",
                StopBits::Two => "2",
            },
            ConfigParam::EnterSends => match profile.enter_sends {
                NewlineMode::Cr => "CR",
                NewlineMode::Lf => "LF",
                NewlineMode::CrLf => "CRLF",
            },
            ConfigParam::LocalEcho => on_off(profile.local_echo),
            ConfigParam::EscapeSequences => on_off(profile.escape_sequences),
            ConfigParam::ReverseVideo => on_off(profile.reverse_video),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index of the profile in use (0-based)
    pub active_profile: usize,
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_profile: 0,
            profiles: vec![Profile::default(); PROFILE_COUNT],
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to the
    /// defaults when the file is missing or broken.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    info!("loaded config from {}", path.display());
                    config
                }
                Err(err) => {
                    warn!("{}; using defaults", err);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration text. Profiles beyond the second are dropped and
    /// missing ones take the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.profiles.resize(PROFILE_COUNT, Profile::default());
        if config.active_profile >= PROFILE_COUNT {
            return Err(ConfigError::UnknownProfile(config.active_profile + 1));
        }
        Ok(config)
    }

    /// Directory holding the config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".thinterm"))
    }

    /// Get config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Profile currently in use
    pub fn active(&self) -> &Profile {
        &self.profiles[self.active_profile]
    }

    /// Switch to profile `index` (0-based).
    pub fn select_profile(&mut self, index: usize) -> Result<(), ConfigError> {
        if index >= PROFILE_COUNT {
            return Err(ConfigError::UnknownProfile(index + 1));
        }
        self.active_profile = index;
        Ok(())
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
