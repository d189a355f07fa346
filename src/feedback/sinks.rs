//! Feedback sink implementations

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{Cue, FeedbackEvent};

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback sink is unreachable: {0}")]
    Unreachable(String),
}

/// Receiver of feedback events
///
/// Called synchronously while the controller holds its session lock, so
/// implementations must return promptly and never block.
pub trait FeedbackSink: Send + Sync {
    fn dispatch(&self, event: &FeedbackEvent) -> Result<(), FeedbackError>;
}

/// Writes every event to the tracing log
#[derive(Debug, Default, Clone)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn dispatch(&self, event: &FeedbackEvent) -> Result<(), FeedbackError> {
        match &event.cue {
            Cue::Phase { phase, cycle, total_cycles, duration_secs } => {
                debug!("Phase {:?} ({}s), cycle {}/{}", phase, duration_secs, cycle, total_cycles);
            }
            Cue::Complete { total_cycles } => info!("Session complete after {} cycles", total_cycles),
            Cue::Reset => debug!("Session reset"),
            Cue::Announcement => debug!("Announcement: {:?}", event.speech),
        }
        Ok(())
    }
}

/// Forwards events to every subscribed view
#[derive(Debug, Clone)]
pub struct BroadcastFeedback {
    tx: broadcast::Sender<FeedbackEvent>,
}

impl BroadcastFeedback {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.tx.subscribe()
    }
}

impl FeedbackSink for BroadcastFeedback {
    fn dispatch(&self, event: &FeedbackEvent) -> Result<(), FeedbackError> {
        self.tx
            .send(event.clone())
            .map(|_| ())
            .map_err(|_| FeedbackError::Unreachable("no view is subscribed".to_string()))
    }
}
