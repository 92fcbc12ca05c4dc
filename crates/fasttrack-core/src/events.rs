use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::TrackState;

/// Every state change of the tracker produces an Event.
/// Front-ends render them; the session persists on the ones that matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FastStarted {
        started_at: DateTime<Utc>,
        limit_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FastPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FastResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// One-second advance from the interval driver.
    FastTicked {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Elapsed time recomputed from the wall clock on foreground.
    FastResynced {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// App went to the background; display ticks stop, the fast does not.
    TickingSuspended {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FastCompleted {
        elapsed_secs: u64,
        limit_secs: u64,
        at: DateTime<Utc>,
    },
    FastReset {
        at: DateTime<Utc>,
    },
    FastLogged {
        log_id: i64,
        duration_minutes: u64,
        at: DateTime<Utc>,
    },
    LimitChanged {
        limit_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TrackState,
        started_at: Option<DateTime<Utc>>,
        elapsed_secs: u64,
        limit_secs: u64,
        remaining_secs: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::FastCompleted { .. })
    }
}
