//! Per-user fasting session.
//!
//! Owns the tracker and everything around it: the store it is persisted to,
//! the clock, the log API, and the lifecycle subscription that exists while
//! the fast is tracking. Front-ends hold one session and call into it.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch;

use crate::api::{FastLogApi, FastLogRecord};
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::lifecycle::{AppLifecycle, LifecycleSubscription};
use crate::storage::TrackStore;
use crate::tracker::{self, FastingTrack, FastingTracker, SharedTracker, TrackState};

/// Events held for [`FastingSession::next_event`] before ticks are dropped.
pub const EVENT_BUFFER: usize = 64;

pub struct FastingSession<S, A> {
    tracker: SharedTracker,
    store: S,
    api: A,
    clock: Arc<dyn Clock>,
    lifecycle: watch::Receiver<AppLifecycle>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    subscription: Option<LifecycleSubscription>,
}

impl<S: TrackStore, A: FastLogApi> FastingSession<S, A> {
    /// Rehydrate the persisted track. An `Empty` track takes
    /// `default_limit_secs`; a fast in progress keeps the length it was
    /// started with. A tracking fast is resynced right away when the app is
    /// in the foreground.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        store: S,
        api: A,
        clock: Arc<dyn Clock>,
        lifecycle: watch::Receiver<AppLifecycle>,
        default_limit_secs: u64,
    ) -> Result<Self> {
        let mut track = store
            .load_track()?
            .unwrap_or_else(|| FastingTrack::with_limit(default_limit_secs));
        if track.state() == TrackState::Empty {
            track.limit_secs = default_limit_secs;
        }
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let mut session = Self {
            tracker: tracker::shared(FastingTracker::from_track(track)),
            store,
            api,
            clock,
            lifecycle,
            events_tx,
            events_rx,
            subscription: None,
        };

        if *session.lifecycle.borrow() == AppLifecycle::Foreground {
            let resynced = session.with_tracker(|t, now| t.resync(now));
            if let Some(event) = resynced {
                tracing::info!(?event, "resynced persisted fast");
                session.persist()?;
                // Fresh queue owned by the session, so this cannot fail.
                let _ = session.events_tx.try_send(event);
            }
        }
        session.sync_subscription();
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn track(&self) -> FastingTrack {
        tracker::lock(&self.tracker).track().clone()
    }

    pub fn state(&self) -> TrackState {
        tracker::lock(&self.tracker).state()
    }

    pub fn snapshot(&self) -> Event {
        tracker::lock(&self.tracker).snapshot(self.clock.now())
    }

    /// Whether the lifecycle subscription (and so the tick driver) is held.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, at: Option<NaiveTime>, limit_secs: u64) -> Result<Event> {
        self.command(|t, now| t.start(at, limit_secs, now))
    }

    pub fn pause(&mut self) -> Result<Event> {
        self.command(|t, now| t.pause(now))
    }

    pub fn resume(&mut self) -> Result<Event> {
        self.command(|t, now| t.resume(now))
    }

    pub fn reset(&mut self) -> Result<Event> {
        self.command(|t, now| t.reset(now))
    }

    /// Reset from any state after explicit confirmation.
    pub fn abandon(&mut self) -> Result<Event> {
        self.command(|t, now| Ok(t.abandon(now)))
    }

    /// Change the length of the next fast. Only lasts until the next `open`
    /// unless the caller also stores it as its default.
    pub fn set_limit(&mut self, limit_secs: u64) -> Result<Event> {
        self.command(|t, now| t.set_limit(limit_secs, now))
    }

    /// Submit the finished (or paused) fast to the log API.
    ///
    /// On failure the track is left exactly as it was; nothing is retried.
    /// Once the API has accepted the log the fast is cleared, and local
    /// persistence problems after that point are only logged.
    pub async fn log(&mut self, at: Option<NaiveTime>) -> Result<(FastLogRecord, Event)> {
        let request = self.with_tracker(|t, now| t.prepare_log(at, now))?;

        let record = match self.api.create_fast_log(&request).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "fast log submission failed");
                return Err(err.into());
            }
        };

        let event = self.with_tracker(|t, now| t.finish_log(&record, now))?;
        tracing::info!(log_id = record.id, minutes = record.duration_minutes, "fast logged");
        self.sync_subscription();
        self.persist_logged();
        if let Err(err) = self.store.record_log(&record) {
            tracing::warn!(error = %err, log_id = record.id, "failed to record fast log locally");
        }
        Ok((record, event))
    }

    /// Next event from the driver or the lifecycle listener.
    ///
    /// Returns `None` when nothing is running and no event is queued. At most
    /// [`EVENT_BUFFER`] events wait here; ticks beyond that are dropped while
    /// completion and lifecycle events wait for room.
    pub async fn next_event(&mut self) -> Option<Event> {
        let event = match self.events_rx.try_recv() {
            Ok(event) => event,
            Err(_) if self.subscription.is_none() => return None,
            Err(_) => self.events_rx.recv().await?,
        };

        match &event {
            Event::FastCompleted { .. } => {
                self.sync_subscription();
                self.persist_logged();
            }
            Event::FastResynced { .. } | Event::TickingSuspended { .. } => self.persist_logged(),
            _ => {}
        }
        Some(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn with_tracker<T>(
        &self,
        f: impl FnOnce(&mut FastingTracker, DateTime<FixedOffset>) -> T,
    ) -> T {
        let now = self.clock.now();
        f(&mut tracker::lock(&self.tracker), now)
    }

    /// Apply a user command to a copy of the tracker and commit it only once
    /// it is stored. On any error the session is left unchanged.
    fn command(
        &mut self,
        f: impl FnOnce(
            &mut FastingTracker,
            DateTime<FixedOffset>,
        ) -> std::result::Result<Event, ValidationError>,
    ) -> Result<Event> {
        let event = {
            let mut current = tracker::lock(&self.tracker);
            let mut next = current.clone();
            let event = f(&mut next, self.clock.now())?;
            self.store.save_track(next.track())?;
            *current = next;
            event
        };
        tracing::info!(?event, "fasting state changed");
        self.sync_subscription();
        Ok(event)
    }

    /// Hold a lifecycle subscription iff the fast is tracking.
    fn sync_subscription(&mut self) {
        let tracking = tracker::lock(&self.tracker).is_tracking();
        match (tracking, self.subscription.is_some()) {
            (true, false) => {
                tracing::debug!("acquiring lifecycle subscription");
                self.subscription = Some(LifecycleSubscription::acquire(
                    Arc::clone(&self.tracker),
                    Arc::clone(&self.clock),
                    self.events_tx.clone(),
                    self.lifecycle.clone(),
                ));
            }
            (false, true) => {
                tracing::debug!("releasing lifecycle subscription");
                self.subscription = None;
            }
            _ => {}
        }
    }

    fn persist(&self) -> Result<()> {
        let track = self.track();
        self.store.save_track(&track)
    }

    fn persist_logged(&self) {
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist fasting track");
        }
    }
}
