//! Breathing phases and rhythm configuration

use serde::{Deserialize, Serialize};

/// One named interval within a breathing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

impl Phase {
    /// Phases in the order they occur within a cycle
    pub const ORDER: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Rest];

    /// Instruction label shown and spoken to the user
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Hold => "Hold",
            Phase::Exhale => "Exhale",
            Phase::Rest => "Rest",
        }
    }
}

/// Immutable rhythm snapshot consumed by a session
///
/// Durations are whole seconds. A zero duration is valid and collapses the
/// dwell time of that phase while still producing its transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmConfig {
    pub inhale: u32,
    pub hold: u32,
    pub exhale: u32,
    pub rest: u32,
    pub total_cycles: u32,
}

impl RhythmConfig {
    pub fn new(inhale: u32, hold: u32, exhale: u32, rest: u32, total_cycles: u32) -> Self {
        Self {
            inhale,
            hold,
            exhale,
            rest,
            total_cycles,
        }
    }

    /// Duration of a single phase in seconds
    pub fn seconds(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold => self.hold,
            Phase::Exhale => self.exhale,
            Phase::Rest => self.rest,
        }
    }

    /// Length of one full cycle in milliseconds
    pub fn cycle_millis(&self) -> u64 {
        Phase::ORDER
            .iter()
            .map(|&phase| u64::from(self.seconds(phase)) * 1000)
            .sum()
    }

    /// Whether a session with this rhythm would run at all
    pub fn is_runnable(&self) -> bool {
        self.total_cycles > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_millis_sums_all_phases() {
        let rhythm = RhythmConfig::new(4, 7, 8, 0, 3);
        assert_eq!(rhythm.cycle_millis(), 19_000);
    }

    #[test]
    fn zero_cycles_is_not_runnable() {
        assert!(!RhythmConfig::new(4, 4, 4, 4, 0).is_runnable());
        assert!(RhythmConfig::new(4, 0, 4, 0, 1).is_runnable());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(RhythmConfig::new(4, 7, 8, 0, 10)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"inhale": 4, "hold": 7, "exhale": 8, "rest": 0, "totalCycles": 10})
        );
    }
}
