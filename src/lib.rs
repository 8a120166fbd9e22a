//! thinterm - a VT100 serial terminal
//!
//! The [`core`] modules hold the display-independent terminal: the escape
//! sequence parser, the character grid, the setup screen and the host
//! link. [`ui`] draws the grid on a host console and maps host keys.

pub mod config;
pub mod core;
pub mod ui;
