//! Phase timer engine
//!
//! Pure scheduling logic for breathing rhythms. Given a [`RhythmConfig`] the
//! engine produces the ordered transition events of one cycle, or of a whole
//! session, without holding any mutable state of its own.

pub mod phase;
pub mod schedule;

// Re-export main types
pub use phase::{Phase, RhythmConfig};
pub use schedule::{cycle_events, session_events, CycleEvents, EventKind, PhaseEvent, SessionEvents};
