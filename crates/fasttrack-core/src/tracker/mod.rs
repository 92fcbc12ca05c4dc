mod machine;
mod track;

pub use machine::{resolve_time_of_day, FastingTracker};
pub use track::{FastingTrack, TrackState, DEFAULT_LIMIT_SECS};

use std::sync::{Arc, Mutex, MutexGuard};

/// Tracker shared between the session, the tick driver and the lifecycle
/// subscription. Never held across an `.await`.
pub type SharedTracker = Arc<Mutex<FastingTracker>>;

pub fn shared(tracker: FastingTracker) -> SharedTracker {
    Arc::new(Mutex::new(tracker))
}

/// Lock the shared tracker. A panic while holding the lock cannot leave the
/// record half-written, so poisoning is ignored.
pub fn lock(tracker: &SharedTracker) -> MutexGuard<'_, FastingTracker> {
    tracker.lock().unwrap_or_else(|e| e.into_inner())
}
