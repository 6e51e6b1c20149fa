//! loan-wizard - Stepwise Loan Application Library
//!
//! Collects a loan application over a fixed sequence of validated steps,
//! keeps partial progress on disk and mirrors every completed step to a
//! remote record store.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
