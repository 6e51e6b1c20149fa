//! Application layer managing the wizard session and user workflows.
//!
//! The controller owns the session state machine; the notice board and the
//! terminal app state sit on top of it.

pub mod controller;
pub mod wizard_error;
pub mod notice;
pub mod state;

pub use controller::*;
pub use wizard_error::*;
pub use notice::*;
pub use state::*;
