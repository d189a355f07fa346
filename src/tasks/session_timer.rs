//! Session timer background task

use std::time::Duration;
use tokio::{
    task::yield_now,
    time::{sleep_until, Instant},
};
use tracing::debug;

use crate::{
    engine::{cycle_events, EventKind, Phase, RhythmConfig},
    session::{Advance, SessionController},
};

/// Drive one session's phase transitions until completion or cancellation
///
/// Each cycle is re-anchored at the moment the previous cycle ended, so
/// timer drift never accumulates across cycles. Inhale of the first cycle is
/// applied by [`SessionController::start`] and skipped here.
pub async fn session_timer_task(
    controller: SessionController,
    generation: u64,
    rhythm: RhythmConfig,
    started_at: Instant,
) {
    debug!("Session timer started (generation {})", generation);
    let mut anchor = started_at;

    for cycle in 1..=rhythm.total_cycles {
        for event in cycle_events(&rhythm, cycle) {
            if cycle == 1 && event.kind == EventKind::Phase(Phase::Inhale) {
                continue;
            }

            let deadline = anchor + Duration::from_millis(event.offset_ms);
            if deadline > Instant::now() {
                sleep_until(deadline).await;
            } else {
                // Zero-length phases must still reach an await so the task stays cancellable
                yield_now().await;
            }

            match controller.fire(generation, event) {
                Advance::Continue => {}
                Advance::Finished => {
                    debug!("Session timer finished (generation {})", generation);
                    return;
                }
                Advance::Stale => {
                    debug!("Session timer superseded (generation {})", generation);
                    return;
                }
            }
        }
        anchor = Instant::now();
    }
}
