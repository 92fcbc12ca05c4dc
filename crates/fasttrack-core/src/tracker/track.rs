//! Persisted record of the current fast.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default target fast: 16 hours.
pub const DEFAULT_LIMIT_SECS: u64 = 16 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Empty,
    Tracking,
    /// Paused by the user; elapsed time is frozen.
    Tracked,
    Complete,
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackState::Empty => "empty",
            TrackState::Tracking => "tracking",
            TrackState::Tracked => "tracked",
            TrackState::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Durable state of the user's fast.
///
/// `started_at` is set iff `state == Tracking`, and `elapsed_secs` never
/// exceeds `limit_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastingTrack {
    pub(crate) state: TrackState,
    #[serde(default)]
    pub(crate) started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) elapsed_secs: u64,
    /// Elapsed time carried into the current tracking interval by a resume.
    #[serde(default)]
    pub(crate) banked_secs: u64,
    pub(crate) limit_secs: u64,
    #[serde(default)]
    pub(crate) start_time_of_day_secs: u32,
}

impl FastingTrack {
    pub fn with_limit(limit_secs: u64) -> Self {
        Self {
            state: TrackState::Empty,
            started_at: None,
            elapsed_secs: 0,
            banked_secs: 0,
            limit_secs,
            start_time_of_day_secs: 0,
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    pub fn start_time_of_day_secs(&self) -> u32 {
        self.start_time_of_day_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.limit_secs.saturating_sub(self.elapsed_secs)
    }

    /// 0.0 .. 100.0 progress toward the target.
    pub fn progress_pct(&self) -> f64 {
        if self.limit_secs == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / self.limit_secs as f64 * 100.0).min(100.0)
    }

    /// Back to `Empty`, keeping the user's target length and start preference.
    pub(crate) fn cleared(&self) -> Self {
        Self {
            start_time_of_day_secs: self.start_time_of_day_secs,
            ..Self::with_limit(self.limit_secs)
        }
    }
}

impl Default for FastingTrack {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT_SECS)
    }
}
