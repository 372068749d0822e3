use crate::state::AppState;
use crate::types::PollId;
use std::time::Duration;

/// Longest single nap. Tokio timers top out around two years, so long
/// windows sleep in bounded slices.
const MAX_NAP: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Spawn the background task that finalizes a poll once its window
/// elapses. One watcher per poll; finalization tolerates repeats, so a
/// watcher firing against an already-finalized poll is a no-op.
pub fn spawn_deadline_watcher(state: AppState, poll_id: PollId, window: Duration) {
    tokio::spawn(async move {
        let mut remaining = window;
        loop {
            let nap = remaining.min(MAX_NAP);
            tokio::time::sleep(nap).await;
            remaining = remaining.saturating_sub(nap);
            if remaining.is_zero() {
                break;
            }
        }

        tracing::debug!("Window for poll {} elapsed", poll_id);
        state.finalize_poll(&poll_id).await;
    });
}
