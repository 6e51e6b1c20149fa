//! Presentation layer handling terminal UI and user input.
//!
//! This module renders the wizard steps with ratatui and maps keyboard
//! and mouse events onto application actions.

pub mod ui;
pub mod input;

pub use ui::*;
pub use input::*;
