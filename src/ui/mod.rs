//! User interface rendering and input handling.
//!
//! - **renderer**: draws the emulated grid on the host console
//! - **keymapper**: host key events to logical key codes

pub mod keymapper;
pub mod renderer;

pub use keymapper::*;
pub use renderer::*;
