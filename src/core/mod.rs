//! Core terminal emulation components.
//!
//! This module contains the terminal logic, independent of any display:
//!
//! - **term**: VT100 grid, cursor state and escape sequence parser
//! - **keys**: logical key codes and the sequences special keys send
//! - **queue**: bounded single-producer/single-consumer queues
//! - **link**: host byte channel (transport trait, reader thread, TCP)
//! - **setup**: profile editor drawn into the grid
//! - **session**: ties parser, link and setup screen together
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Transport (outbound bytes to the host)
//! ├── SetupScreen (while open)
//! └── TerminalState
//!     ├── Grid (one-byte cells)
//!     ├── Cursor + margins + attributes
//!     └── VtParser (fed byte by byte)
//! ```

pub mod keys;
pub mod link;
pub mod queue;
pub mod session;
pub mod setup;
pub mod term;
