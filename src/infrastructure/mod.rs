//! Infrastructure layer providing external service integrations.
//!
//! This module contains the session snapshot storage, the client for the
//! remote record store, configuration and log setup.

pub mod persistence;
pub mod remote;
pub mod config;
pub mod logging;

pub use persistence::*;
pub use remote::*;
pub use config::*;
pub use logging::*;
