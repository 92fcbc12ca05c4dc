//! Once-per-second tick source.
//!
//! The driver owns at most one interval task. Starting it again cancels the
//! previous task first, and dropping the driver cancels it too.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::events::Event;
use crate::tracker::{self, SharedTracker};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TickDriver {
    tracker: SharedTracker,
    clock: Arc<dyn Clock>,
    events: Sender<Event>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new(
        tracker: SharedTracker,
        clock: Arc<dyn Clock>,
        events: Sender<Event>,
    ) -> Self {
        Self {
            tracker,
            clock,
            events,
            handle: None,
        }
    }

    /// Spawn the interval task, replacing any running one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        let tracker = Arc::clone(&self.tracker);
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let next = tracker::lock(&tracker).tick(clock.now());
                let Some(event) = next else {
                    tracing::debug!("tracker left tracking state, driver exiting");
                    break;
                };
                let done = event.is_completion();
                // A lagging receiver misses ticks, never the completion.
                let delivered = if done {
                    tracing::info!("fast reached its target");
                    events.send(event).await.is_ok()
                } else {
                    !matches!(events.try_send(event), Err(TrySendError::Closed(_)))
                };
                if !delivered || done {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
