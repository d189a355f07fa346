//! Session state snapshot

use serde::{Deserialize, Serialize};

use crate::engine::Phase;

/// Where the breathing session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Inhale,
    Hold,
    Exhale,
    Rest,
    Complete,
}

impl From<Phase> for SessionPhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Inhale => SessionPhase::Inhale,
            Phase::Hold => SessionPhase::Hold,
            Phase::Exhale => SessionPhase::Exhale,
            Phase::Rest => SessionPhase::Rest,
        }
    }
}

/// Ephemeral session state, rebuilt whenever a session starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Cycle in progress, 0 while idle
    pub current_cycle: u32,
    pub total_cycles: u32,
    /// Incremented on every start and reset; stale timers compare against it
    pub generation: u64,
}

impl SessionState {
    /// Create an idle session state
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            current_cycle: 0,
            total_cycles: 0,
            generation: 0,
        }
    }

    /// True iff a breathing phase is in progress
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Inhale | SessionPhase::Hold | SessionPhase::Exhale | SessionPhase::Rest
        )
    }

    /// Counter text shown under the circle, e.g. `3 / 10`
    pub fn counter_text(&self) -> String {
        format!("{} / {}", self.current_cycle, self.total_cycles)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
