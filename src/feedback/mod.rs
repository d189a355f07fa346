//! Feedback dispatch module
//!
//! Side-effect sinks notified by the session controller at every phase
//! transition: instruction text, circle animation, haptic pulse and speech.

pub mod event;
pub mod sinks;

// Re-export main types
pub use event::{Animation, Cue, CuePreferences, FeedbackEvent, SPEECH_PITCH, SPEECH_RATE};
pub use sinks::{BroadcastFeedback, FeedbackError, FeedbackSink, TracingFeedback};
