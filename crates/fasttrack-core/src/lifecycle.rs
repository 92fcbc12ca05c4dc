//! Foreground/background resynchronisation.
//!
//! A [`LifecycleSubscription`] exists exactly while the fast is tracking. It
//! owns the tick driver: background stops the display ticks (the fast keeps
//! running), foreground recomputes elapsed time from the wall clock and
//! restarts them.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::driver::TickDriver;
use crate::events::Event;
use crate::tracker::{self, SharedTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    Foreground,
    Background,
}

/// Scoped lifecycle listener. Dropping it tears down the listener and the
/// tick driver it owns.
pub struct LifecycleSubscription {
    handle: JoinHandle<()>,
}

impl LifecycleSubscription {
    /// Start listening. Ticks immediately if the app is in the foreground.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn acquire(
        tracker: SharedTracker,
        clock: Arc<dyn Clock>,
        events: Sender<Event>,
        mut lifecycle: watch::Receiver<AppLifecycle>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut driver =
                TickDriver::new(Arc::clone(&tracker), Arc::clone(&clock), events.clone());
            if *lifecycle.borrow_and_update() == AppLifecycle::Foreground {
                driver.start();
            }

            loop {
                if lifecycle.changed().await.is_err() {
                    // No more lifecycle signals; keep the current ticking as is.
                    std::future::pending::<()>().await;
                }
                let phase = *lifecycle.borrow_and_update();
                match phase {
                    AppLifecycle::Foreground => {
                        let next = tracker::lock(&tracker).resync(clock.now());
                        let Some(event) = next else {
                            break;
                        };
                        let done = event.is_completion();
                        tracing::info!(?event, "resynced on foreground");
                        if events.send(event).await.is_err() || done {
                            break;
                        }
                        driver.start();
                    }
                    AppLifecycle::Background => {
                        driver.stop();
                        let elapsed = {
                            let tracker = tracker::lock(&tracker);
                            tracker.is_tracking().then(|| tracker.elapsed_secs())
                        };
                        let Some(elapsed_secs) = elapsed else {
                            break;
                        };
                        tracing::debug!(elapsed_secs, "ticking suspended");
                        let suspended = Event::TickingSuspended {
                            elapsed_secs,
                            at: clock.now().with_timezone(&Utc),
                        };
                        if events.send(suspended).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::tracker::{FastingTracker, TrackState};
    use chrono::{DateTime, Duration as ChronoDuration, FixedOffset};
    use std::time::Duration;
    use tokio::sync::mpsc;

    const LIMIT: u64 = 57_600;

    fn t0() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-03-01T20:00:00+00:00").unwrap()
    }

    fn setup() -> (SharedTracker, Arc<ManualClock>) {
        let mut tracker = FastingTracker::new(LIMIT);
        tracker.start(None, LIMIT, t0()).unwrap();
        (tracker::shared(tracker), Arc::new(ManualClock::new(t0())))
    }

    #[tokio::test(start_paused = true)]
    async fn background_suspends_and_foreground_resyncs() {
        let (shared, clock) = setup();
        let (life_tx, life_rx) = watch::channel(AppLifecycle::Foreground);
        let (tx, mut rx) = mpsc::channel(16);
        let sub = LifecycleSubscription::acquire(Arc::clone(&shared), clock.clone(), tx, life_rx);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Event::FastTicked { elapsed_secs: 1, .. }));

        life_tx.send(AppLifecycle::Background).unwrap();
        let suspended = rx.recv().await.unwrap();
        assert!(matches!(suspended, Event::TickingSuspended { elapsed_secs: 1, .. }));

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker::lock(&shared).state(), TrackState::Tracking);

        clock.set(t0() + ChronoDuration::seconds(30_000));
        life_tx.send(AppLifecycle::Foreground).unwrap();
        let resynced = rx.recv().await.unwrap();
        assert!(matches!(resynced, Event::FastResynced { elapsed_secs: 30_000, .. }));
        let ticked = rx.recv().await.unwrap();
        assert!(matches!(ticked, Event::FastTicked { elapsed_secs: 30_001, .. }));

        clock.set(t0() + ChronoDuration::seconds(60_000));
        life_tx.send(AppLifecycle::Foreground).unwrap();
        let completed = rx.recv().await.unwrap();
        assert!(matches!(
            completed,
            Event::FastCompleted { elapsed_secs: LIMIT, .. }
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!sub.is_active());
        assert_eq!(tracker::lock(&shared).elapsed_secs(), LIMIT);
    }

    #[tokio::test(start_paused = true)]
    async fn acquired_in_background_waits_for_foreground() {
        let (shared, clock) = setup();
        let (life_tx, life_rx) = watch::channel(AppLifecycle::Background);
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = LifecycleSubscription::acquire(Arc::clone(&shared), clock.clone(), tx, life_rx);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());

        clock.set(t0() + ChronoDuration::seconds(42));
        life_tx.send(AppLifecycle::Foreground).unwrap();
        let resynced = rx.recv().await.unwrap();
        assert!(matches!(resynced, Event::FastResynced { elapsed_secs: 42, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_subscription_stops_ticks() {
        let (shared, clock) = setup();
        let (_life_tx, life_rx) = watch::channel(AppLifecycle::Foreground);
        let (tx, mut rx) = mpsc::channel(16);
        let sub = LifecycleSubscription::acquire(Arc::clone(&shared), clock, tx, life_rx);

        rx.recv().await.unwrap();
        drop(sub);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker::lock(&shared).elapsed_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_lifecycle_channel_keeps_ticking() {
        let (shared, clock) = setup();
        let (life_tx, life_rx) = watch::channel(AppLifecycle::Foreground);
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = LifecycleSubscription::acquire(Arc::clone(&shared), clock, tx, life_rx);

        drop(life_tx);
        for expected in 1..=3 {
            let event = rx.recv().await.unwrap();
            assert!(matches!(event, Event::FastTicked { elapsed_secs, .. } if elapsed_secs == expected));
        }
    }
}
