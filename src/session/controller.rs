//! Breathing session controller
//!
//! State machine over {Idle, Running(phase, cycle), Complete}. Every start and
//! reset bumps a generation token; timer callbacks carry the token they were
//! scheduled under and are ignored once it is stale, so a cancelled chain can
//! never produce a side effect after the cancelling call returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    engine::{EventKind, Phase, PhaseEvent, RhythmConfig},
    feedback::{CuePreferences, FeedbackEvent, FeedbackSink},
    state::{SessionPhase, SessionState},
    tasks::session_timer_task,
};

/// Outcome of delivering a timer event to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Keep scheduling the remaining events
    Continue,
    /// The session completed with this event
    Finished,
    /// The event belongs to a cancelled or superseded session
    Stale,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    rhythm: Option<RhythmConfig>,
    cues: CuePreferences,
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    sinks: Vec<Arc<dyn FeedbackSink>>,
}

/// Handle to the single session controller, cheap to clone
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("sinks", &self.shared.sinks.len())
            .finish()
    }
}

impl SessionController {
    /// Create an idle controller notifying the given sinks
    pub fn new(sinks: Vec<Arc<dyn FeedbackSink>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::new(),
                    rhythm: None,
                    cues: CuePreferences::default(),
                    timer: None,
                }),
                sinks,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner stays consistent across panics in sinks, so recover the guard
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, event: &FeedbackEvent) {
        for sink in &self.shared.sinks {
            if let Err(e) = sink.dispatch(event) {
                debug!("Skipping feedback side effect: {}", e);
            }
        }
    }

    /// Current session state snapshot
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Rhythm the running or last completed session was started with
    pub fn rhythm(&self) -> Option<RhythmConfig> {
        self.lock().rhythm
    }

    /// Start a session from an immutable rhythm snapshot
    ///
    /// Calling this while a session runs stops it first and begins a fresh
    /// Inhale at cycle 1; there is never more than one timer chain. A rhythm
    /// with zero cycles leaves the controller idle. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self, rhythm: RhythmConfig, cues: CuePreferences) -> SessionState {
        let mut inner = self.lock();

        if inner.state.is_active() {
            info!("Session already running, restarting");
            self.reset_locked(&mut inner);
        } else {
            Self::cancel_timer(&mut inner);
        }

        if !rhythm.is_runnable() {
            warn!("Rhythm has zero cycles, session not started");
            return inner.state.clone();
        }

        let generation = inner.state.generation + 1;
        inner.rhythm = Some(rhythm);
        inner.cues = cues;
        inner.state = SessionState {
            phase: SessionPhase::Inhale,
            current_cycle: 1,
            total_cycles: rhythm.total_cycles,
            generation,
        };

        info!(
            "Starting session: {}-{}-{}-{} for {} cycles",
            rhythm.inhale, rhythm.hold, rhythm.exhale, rhythm.rest, rhythm.total_cycles
        );
        self.dispatch(&FeedbackEvent::phase(Phase::Inhale, 1, &rhythm, cues));

        let started_at = Instant::now();
        inner.timer = Some(tokio::spawn(session_timer_task(
            self.clone(),
            generation,
            rhythm,
            started_at,
        )));

        inner.state.clone()
    }

    /// Start/Stop button behaviour: stop if active, otherwise start
    pub fn toggle(&self, rhythm: RhythmConfig, cues: CuePreferences) -> SessionState {
        if self.state().is_active() {
            self.stop()
        } else {
            self.start(rhythm, cues)
        }
    }

    /// Cancel any session and return to Idle
    pub fn reset(&self) -> SessionState {
        let mut inner = self.lock();
        self.reset_locked(&mut inner);
        inner.state.clone()
    }

    /// User-initiated cancellation, same effect as [`reset`](Self::reset)
    pub fn stop(&self) -> SessionState {
        info!("Stopping session");
        self.reset()
    }

    /// Speak a message outside of the breathing cycle
    pub fn announce(&self, text: &str) {
        let _inner = self.lock();
        self.dispatch(&FeedbackEvent::announcement(text));
    }

    fn reset_locked(&self, inner: &mut Inner) {
        Self::cancel_timer(inner);
        inner.state = SessionState {
            generation: inner.state.generation + 1,
            ..SessionState::new()
        };
        self.dispatch(&FeedbackEvent::reset());
    }

    fn cancel_timer(inner: &mut Inner) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
    }

    /// Apply a timer event scheduled under `generation`
    pub fn fire(&self, generation: u64, event: PhaseEvent) -> Advance {
        let mut inner = self.lock();

        if inner.state.generation != generation || !inner.state.is_active() {
            debug!("Ignoring stale timer event {:?} (generation {})", event.kind, generation);
            return Advance::Stale;
        }
        let Some(rhythm) = inner.rhythm else {
            return Advance::Stale;
        };

        match event.kind {
            EventKind::Phase(phase) => {
                if phase == Phase::Inhale {
                    inner.state.current_cycle = event.cycle.min(rhythm.total_cycles);
                }
                inner.state.phase = phase.into();
                let cues = inner.cues;
                self.dispatch(&FeedbackEvent::phase(phase, inner.state.current_cycle, &rhythm, cues));
                Advance::Continue
            }
            EventKind::CycleEnd if event.cycle < rhythm.total_cycles => Advance::Continue,
            EventKind::CycleEnd | EventKind::Complete => {
                // The finishing event runs on the timer task itself; drop the handle
                inner.timer = None;
                inner.state.phase = SessionPhase::Complete;
                info!("Session complete after {} cycles", rhythm.total_cycles);
                self.dispatch(&FeedbackEvent::complete(rhythm.total_cycles));
                Advance::Finished
            }
        }
    }
}
