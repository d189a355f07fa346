//! Session control module
//!
//! Owns the lifecycle of the single breathing session: start, stop, reset and
//! the timer-driven advancement between phases.

pub mod controller;

// Re-export main types
pub use controller::{Advance, SessionController};
