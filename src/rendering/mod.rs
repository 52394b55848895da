//! # Rendering Module
//!
//! Message formatting and the macroquad display.

pub mod display;
pub mod messages;

pub use display::*;
pub use messages::*;
