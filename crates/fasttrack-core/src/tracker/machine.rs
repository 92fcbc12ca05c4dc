//! Fasting state machine.
//!
//! Pure with respect to time: every command takes `now` from the caller.
//! There is no internal thread; the tick driver and the lifecycle
//! subscription call `tick()` and `resync()`.
//!
//! ## State Transitions
//!
//! ```text
//! Empty -> Tracking -> Tracked -> Tracking -> Complete -> Empty
//!                        |                                 ^
//!                        +---------- reset / log ----------+
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike, Utc};

use super::track::{FastingTrack, TrackState};
use crate::api::{FastLogRecord, FastLogRequest};
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Default)]
pub struct FastingTracker {
    track: FastingTrack,
}

impl FastingTracker {
    pub fn new(limit_secs: u64) -> Self {
        Self {
            track: FastingTrack::with_limit(limit_secs),
        }
    }

    /// Rehydrate from a persisted record.
    pub fn from_track(track: FastingTrack) -> Self {
        Self { track }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn track(&self) -> &FastingTrack {
        &self.track
    }

    pub fn state(&self) -> TrackState {
        self.track.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.track.elapsed_secs
    }

    pub fn limit_secs(&self) -> u64 {
        self.track.limit_secs
    }

    pub fn is_tracking(&self) -> bool {
        self.track.state == TrackState::Tracking
    }

    pub fn snapshot(&self, now: DateTime<FixedOffset>) -> Event {
        Event::StateSnapshot {
            state: self.track.state,
            started_at: self.track.started_at,
            elapsed_secs: self.track.elapsed_secs,
            limit_secs: self.track.limit_secs,
            remaining_secs: self.track.remaining_secs(),
            progress_pct: self.track.progress_pct(),
            at: now.with_timezone(&Utc),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fast at `start` today (or now when `None`).
    ///
    /// A start in the past back-fills elapsed time, capped one second short of
    /// the limit so the fast cannot complete before the driver runs.
    pub fn start(
        &mut self,
        start: Option<NaiveTime>,
        limit_secs: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<Event, ValidationError> {
        self.expect_state("start", &[TrackState::Empty])?;
        if limit_secs == 0 {
            return Err(ValidationError::InvalidLimit);
        }

        let time_of_day = start.unwrap_or_else(|| now.time());
        let started_at = resolve_time_of_day(now, time_of_day);
        let now_utc = now.with_timezone(&Utc);
        if started_at > now_utc {
            return Err(ValidationError::FutureTime {
                requested: started_at,
            });
        }

        let since_start = seconds_between(started_at, now_utc);
        self.track = FastingTrack {
            state: TrackState::Tracking,
            started_at: Some(started_at),
            elapsed_secs: since_start.min(limit_secs - 1),
            banked_secs: 0,
            limit_secs,
            start_time_of_day_secs: time_of_day.num_seconds_from_midnight(),
        };

        Ok(Event::FastStarted {
            started_at,
            limit_secs,
            elapsed_secs: self.track.elapsed_secs,
            at: now_utc,
        })
    }

    pub fn pause(&mut self, now: DateTime<FixedOffset>) -> Result<Event, ValidationError> {
        self.expect_state("pause", &[TrackState::Tracking])?;
        self.track.state = TrackState::Tracked;
        self.track.started_at = None;
        self.track.banked_secs = self.track.elapsed_secs;
        Ok(Event::FastPaused {
            elapsed_secs: self.track.elapsed_secs,
            at: now.with_timezone(&Utc),
        })
    }

    pub fn resume(&mut self, now: DateTime<FixedOffset>) -> Result<Event, ValidationError> {
        self.expect_state("resume", &[TrackState::Tracked])?;
        let now_utc = now.with_timezone(&Utc);
        self.track.state = TrackState::Tracking;
        self.track.started_at = Some(now_utc);
        self.track.banked_secs = self.track.elapsed_secs;
        Ok(Event::FastResumed {
            elapsed_secs: self.track.elapsed_secs,
            at: now_utc,
        })
    }

    pub fn reset(&mut self, now: DateTime<FixedOffset>) -> Result<Event, ValidationError> {
        self.expect_state("reset", &[TrackState::Tracked, TrackState::Complete])?;
        Ok(self.clear(now))
    }

    /// Reset from any state. Only for explicit user confirmation.
    pub fn abandon(&mut self, now: DateTime<FixedOffset>) -> Event {
        self.clear(now)
    }

    pub fn set_limit(
        &mut self,
        limit_secs: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<Event, ValidationError> {
        if self.track.state == TrackState::Tracking {
            return Err(ValidationError::LimitLockedWhileTracking);
        }
        self.expect_state("change the fast length", &[TrackState::Empty])?;
        if limit_secs == 0 {
            return Err(ValidationError::InvalidLimit);
        }
        self.track.limit_secs = limit_secs;
        Ok(Event::LimitChanged {
            limit_secs,
            at: now.with_timezone(&Utc),
        })
    }

    /// One-second advance. Returns `None` unless tracking.
    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> Option<Event> {
        if !self.is_tracking() {
            return None;
        }
        self.track.elapsed_secs = (self.track.elapsed_secs + 1).min(self.track.limit_secs);
        if self.track.elapsed_secs == self.track.limit_secs {
            return Some(self.complete(now));
        }
        Some(Event::FastTicked {
            elapsed_secs: self.track.elapsed_secs,
            at: now.with_timezone(&Utc),
        })
    }

    /// Recompute elapsed time from the wall clock. Returns `None` unless tracking.
    ///
    /// Overshooting the limit jumps straight to `Complete` without emitting
    /// the intermediate values.
    pub fn resync(&mut self, now: DateTime<FixedOffset>) -> Option<Event> {
        if !self.is_tracking() {
            return None;
        }
        let started_at = self.track.started_at?;
        let candidate = self
            .track
            .banked_secs
            .saturating_add(seconds_between(started_at, now.with_timezone(&Utc)));

        if candidate < self.track.limit_secs {
            self.track.elapsed_secs = candidate;
            return Some(Event::FastResynced {
                elapsed_secs: candidate,
                at: now.with_timezone(&Utc),
            });
        }
        self.track.elapsed_secs = self.track.limit_secs;
        Some(self.complete(now))
    }

    /// Build the log payload for a finished or manually ended fast.
    /// Does not change state; call [`finish_log`](Self::finish_log) once the
    /// API has accepted it.
    pub fn prepare_log(
        &self,
        log_time: Option<NaiveTime>,
        now: DateTime<FixedOffset>,
    ) -> Result<FastLogRequest, ValidationError> {
        self.expect_state("log", &[TrackState::Tracked, TrackState::Complete])?;
        let now_utc = now.with_timezone(&Utc);
        let log_time = match log_time {
            Some(time) => resolve_time_of_day(now, time),
            None => now_utc,
        };
        if log_time > now_utc {
            return Err(ValidationError::FutureTime {
                requested: log_time,
            });
        }
        Ok(FastLogRequest {
            log_time,
            duration_minutes: self.track.elapsed_secs / 60,
        })
    }

    pub fn finish_log(
        &mut self,
        record: &FastLogRecord,
        now: DateTime<FixedOffset>,
    ) -> Result<Event, ValidationError> {
        self.expect_state("log", &[TrackState::Tracked, TrackState::Complete])?;
        self.track = self.track.cleared();
        Ok(Event::FastLogged {
            log_id: record.id,
            duration_minutes: record.duration_minutes,
            at: now.with_timezone(&Utc),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn expect_state(
        &self,
        action: &'static str,
        allowed: &[TrackState],
    ) -> Result<(), ValidationError> {
        if allowed.contains(&self.track.state) {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition {
                action,
                state: self.track.state,
            })
        }
    }

    fn complete(&mut self, now: DateTime<FixedOffset>) -> Event {
        self.track.state = TrackState::Complete;
        self.track.started_at = None;
        self.track.banked_secs = self.track.elapsed_secs;
        Event::FastCompleted {
            elapsed_secs: self.track.elapsed_secs,
            limit_secs: self.track.limit_secs,
            at: now.with_timezone(&Utc),
        }
    }

    fn clear(&mut self, now: DateTime<FixedOffset>) -> Event {
        self.track = self.track.cleared();
        Event::FastReset {
            at: now.with_timezone(&Utc),
        }
    }
}

/// `time` on the calendar day of `now`, in `now`'s UTC offset.
pub fn resolve_time_of_day(now: DateTime<FixedOffset>, time: NaiveTime) -> DateTime<Utc> {
    let local = now.date_naive().and_time(time);
    let offset = Duration::seconds(i64::from(now.offset().local_minus_utc()));
    (local - offset).and_utc()
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}
