//! Transition event sequences
//!
//! Both sequences are lazy and restartable: calling the constructor again
//! with the same rhythm yields the same events.

use serde::{Deserialize, Serialize};

use super::{Phase, RhythmConfig};

/// What happens at a scheduled offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "phase", rename_all = "camelCase")]
pub enum EventKind {
    /// A phase begins
    Phase(Phase),
    /// The Rest phase of a cycle has run out
    CycleEnd,
    /// The final cycle has run out
    Complete,
}

/// A transition at an offset in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseEvent {
    pub offset_ms: u64,
    /// 1-based cycle the event belongs to
    pub cycle: u32,
    pub kind: EventKind,
}

/// The five events of one cycle, offsets relative to the cycle start
#[derive(Debug, Clone)]
pub struct CycleEvents {
    rhythm: RhythmConfig,
    cycle: u32,
    index: usize,
    offset_ms: u64,
}

/// Build the per-cycle sequence: Inhale, Hold, Exhale, Rest, then CycleEnd
pub fn cycle_events(rhythm: &RhythmConfig, cycle: u32) -> CycleEvents {
    CycleEvents {
        rhythm: *rhythm,
        cycle,
        index: 0,
        offset_ms: 0,
    }
}

impl Iterator for CycleEvents {
    type Item = PhaseEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = match Phase::ORDER.get(self.index) {
            Some(&phase) => EventKind::Phase(phase),
            None if self.index == Phase::ORDER.len() => EventKind::CycleEnd,
            None => return None,
        };

        let event = PhaseEvent {
            offset_ms: self.offset_ms,
            cycle: self.cycle,
            kind,
        };

        if let EventKind::Phase(phase) = kind {
            self.offset_ms += u64::from(self.rhythm.seconds(phase)) * 1000;
        }
        self.index += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (Phase::ORDER.len() + 1).saturating_sub(self.index);
        (left, Some(left))
    }
}

impl ExactSizeIterator for CycleEvents {}

/// The whole session: `4 * total_cycles` phase events then one Complete
///
/// Offsets are relative to the session start. The end of Rest in cycle `k`
/// coincides with Inhale of cycle `k + 1`, so no CycleEnd is emitted here.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    rhythm: RhythmConfig,
    cycle: u32,
    base_ms: u64,
    current: Option<CycleEvents>,
    finished: bool,
}

pub fn session_events(rhythm: &RhythmConfig) -> SessionEvents {
    SessionEvents {
        rhythm: *rhythm,
        cycle: 0,
        base_ms: 0,
        current: None,
        finished: !rhythm.is_runnable(),
    }
}

impl Iterator for SessionEvents {
    type Item = PhaseEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(events) = self.current.as_mut() {
                match events.next() {
                    Some(PhaseEvent {
                        offset_ms,
                        cycle,
                        kind: EventKind::Phase(phase),
                    }) => {
                        return Some(PhaseEvent {
                            offset_ms: self.base_ms + offset_ms,
                            cycle,
                            kind: EventKind::Phase(phase),
                        });
                    }
                    Some(end) => {
                        self.base_ms += end.offset_ms;
                        self.current = None;
                    }
                    None => self.current = None,
                }
                continue;
            }

            if self.cycle < self.rhythm.total_cycles {
                self.cycle += 1;
                self.current = Some(cycle_events(&self.rhythm, self.cycle));
            } else {
                self.finished = true;
                return Some(PhaseEvent {
                    offset_ms: self.base_ms,
                    cycle: self.rhythm.total_cycles,
                    kind: EventKind::Complete,
                });
            }
        }
    }
}
