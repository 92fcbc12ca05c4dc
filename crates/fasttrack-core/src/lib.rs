//! # fasttrack Core Library
//!
//! Business logic for the intermittent-fasting tracker. The CLI (and any
//! other front-end) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Tracker**: a state machine that takes the current time as an argument
//!   and never reads the clock itself
//! - **Driver / Lifecycle**: the once-per-second tick task, owned by a
//!   subscription that exists only while a fast is tracking and resyncs from
//!   the wall clock when the app returns to the foreground
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **API**: REST client that turns a finished fast into a health-log entry
//!
//! ## Key Components
//!
//! - [`FastingTracker`]: Core fasting state machine
//! - [`FastingSession`]: Owns the tracker and its collaborators
//! - [`Database`]: Track and log persistence
//! - [`Config`]: Application configuration management

pub mod api;
pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod session;
pub mod storage;
pub mod tracker;

pub use api::{FastLogApi, FastLogRecord, FastLogRequest, HttpLogClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::TickDriver;
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use lifecycle::{AppLifecycle, LifecycleSubscription};
pub use session::FastingSession;
pub use storage::{Config, Database, MemoryStore, TrackStore};
pub use tracker::{FastingTrack, FastingTracker, TrackState, DEFAULT_LIMIT_SECS};
