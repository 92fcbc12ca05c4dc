//! Durable home of the fasting track.

use std::sync::Mutex;

use super::Database;
use crate::api::FastLogRecord;
use crate::error::Result;
use crate::tracker::FastingTrack;

const TRACK_KEY: &str = "fasting_track";

pub trait TrackStore {
    /// Persisted track, or `None` on first use.
    fn load_track(&self) -> Result<Option<FastingTrack>>;

    fn save_track(&self, track: &FastingTrack) -> Result<()>;

    /// Remember a log the API accepted.
    fn record_log(&self, record: &FastLogRecord) -> Result<()>;
}

impl TrackStore for Database {
    fn load_track(&self) -> Result<Option<FastingTrack>> {
        match self.kv_get(TRACK_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(track) => Ok(Some(track)),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable fasting track");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save_track(&self, track: &FastingTrack) -> Result<()> {
        let json = serde_json::to_string(track)?;
        self.kv_set(TRACK_KEY, &json)?;
        Ok(())
    }

    fn record_log(&self, record: &FastLogRecord) -> Result<()> {
        self.upsert_log(record)?;
        Ok(())
    }
}

/// Non-durable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    track: Mutex<Option<FastingTrack>>,
    logs: Mutex<Vec<FastLogRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<FastLogRecord> {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TrackStore for MemoryStore {
    fn load_track(&self) -> Result<Option<FastingTrack>> {
        Ok(self.track.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save_track(&self, track: &FastingTrack) -> Result<()> {
        *self.track.lock().unwrap_or_else(|e| e.into_inner()) = Some(track.clone());
        Ok(())
    }

    fn record_log(&self, record: &FastLogRecord) -> Result<()> {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

impl<S: TrackStore + ?Sized> TrackStore for std::sync::Arc<S> {
    fn load_track(&self) -> Result<Option<FastingTrack>> {
        (**self).load_track()
    }

    fn save_track(&self, track: &FastingTrack) -> Result<()> {
        (**self).save_track(track)
    }

    fn record_log(&self, record: &FastLogRecord) -> Result<()> {
        (**self).record_log(record)
    }
}
