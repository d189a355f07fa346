//! Feedback event structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{Phase, RhythmConfig};

/// Instruction shown while no session is running
pub const IDLE_INSTRUCTION: &str = "Breathe naturally.";

/// Length of the vibration pulse at each phase boundary
pub const HAPTIC_PULSE_MS: u32 = 50;

/// Speech synthesis settings for a calmer voice
pub const SPEECH_PITCH: f32 = 0.9;
pub const SPEECH_RATE: f32 = 0.9;

/// Which optional cues the user has enabled, captured at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuePreferences {
    pub haptics_enabled: bool,
    pub voice_enabled: bool,
}

/// What triggered a feedback event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Cue {
    #[serde(rename_all = "camelCase")]
    Phase {
        phase: Phase,
        cycle: u32,
        total_cycles: u32,
        duration_secs: u32,
    },
    #[serde(rename_all = "camelCase")]
    Complete { total_cycles: u32 },
    Reset,
    Announcement,
}

/// Breathing circle animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Animation {
    /// Expand over the given number of seconds
    Grow { secs: u32 },
    /// Contract over the given number of seconds
    Shrink { secs: u32 },
    /// Keep the current size
    Steady,
    /// Back to the resting size with no transition
    Clear,
}

/// A single notification for the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub cue: Cue,
    pub instruction: String,
    pub animation: Animation,
    pub haptic_pulse_ms: Option<u32>,
    pub speech: Option<String>,
    pub at: DateTime<Utc>,
}

impl FeedbackEvent {
    /// Feedback for entering a phase
    pub fn phase(phase: Phase, cycle: u32, rhythm: &RhythmConfig, cues: CuePreferences) -> Self {
        let duration_secs = rhythm.seconds(phase);
        let animation = match phase {
            Phase::Inhale => Animation::Grow { secs: duration_secs },
            Phase::Exhale => Animation::Shrink { secs: duration_secs },
            Phase::Hold | Phase::Rest => Animation::Steady,
        };

        Self {
            cue: Cue::Phase {
                phase,
                cycle,
                total_cycles: rhythm.total_cycles,
                duration_secs,
            },
            instruction: phase.label().to_string(),
            animation,
            haptic_pulse_ms: cues.haptics_enabled.then_some(HAPTIC_PULSE_MS),
            speech: cues.voice_enabled.then(|| phase.label().to_string()),
            at: Utc::now(),
        }
    }

    /// Feedback for the end of the final cycle
    pub fn complete(total_cycles: u32) -> Self {
        Self::idle(Cue::Complete { total_cycles })
    }

    /// Feedback for a cancelled or reset session
    pub fn reset() -> Self {
        Self::idle(Cue::Reset)
    }

    /// Speech-only message outside of the breathing cycle
    pub fn announcement(text: impl Into<String>) -> Self {
        Self {
            cue: Cue::Announcement,
            instruction: String::new(),
            animation: Animation::Steady,
            haptic_pulse_ms: None,
            speech: Some(text.into()),
            at: Utc::now(),
        }
    }

    fn idle(cue: Cue) -> Self {
        Self {
            cue,
            instruction: IDLE_INSTRUCTION.to_string(),
            animation: Animation::Clear,
            haptic_pulse_ms: None,
            speech: None,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inhale_grows_over_inhale_duration() {
        let rhythm = RhythmConfig::new(4, 7, 8, 0, 10);
        let event = FeedbackEvent::phase(Phase::Inhale, 1, &rhythm, CuePreferences::default());

        assert_eq!(event.instruction, "Inhale");
        assert_eq!(event.animation, Animation::Grow { secs: 4 });
        assert_eq!(event.haptic_pulse_ms, None);
        assert_eq!(event.speech, None);
    }

    #[test]
    fn exhale_shrinks_and_honours_cue_preferences() {
        let rhythm = RhythmConfig::new(4, 7, 8, 0, 10);
        let cues = CuePreferences {
            haptics_enabled: true,
            voice_enabled: true,
        };
        let event = FeedbackEvent::phase(Phase::Exhale, 3, &rhythm, cues);

        assert_eq!(event.animation, Animation::Shrink { secs: 8 });
        assert_eq!(event.haptic_pulse_ms, Some(HAPTIC_PULSE_MS));
        assert_eq!(event.speech.as_deref(), Some("Exhale"));
        assert_eq!(
            event.cue,
            Cue::Phase {
                phase: Phase::Exhale,
                cycle: 3,
                total_cycles: 10,
                duration_secs: 8
            }
        );
    }

    #[test]
    fn reset_restores_default_instruction() {
        let event = FeedbackEvent::reset();
        assert_eq!(event.instruction, IDLE_INSTRUCTION);
        assert_eq!(event.animation, Animation::Clear);
    }
}
