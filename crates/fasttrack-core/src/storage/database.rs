//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - The current fasting track (key-value store)
//! - Fast logs accepted by the remote API, for local history

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::api::FastLogRecord;
use crate::error::{CoreError, DatabaseError, Result};

/// SQLite database for track state and log history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/fasttrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("fasttrack.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fast_logs (
                id               INTEGER PRIMARY KEY,
                log_time         TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_fast_logs_log_time ON fast_logs(log_time);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Insert or replace a log record returned by the API.
    pub fn upsert_log(&self, record: &FastLogRecord) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO fast_logs (id, log_time, duration_minutes)
             VALUES (?1, ?2, ?3)",
            params![record.id, record.log_time.to_rfc3339(), record.duration_minutes],
        )?;
        Ok(())
    }

    pub fn delete_log(&self, id: i64) -> Result<bool, rusqlite::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM fast_logs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn get_log(&self, id: i64) -> Result<Option<FastLogRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, log_time, duration_minutes FROM fast_logs WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(to_record).transpose()
    }

    /// Logged fasts, newest first.
    pub fn list_logs(&self, limit: usize) -> Result<Vec<FastLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, log_time, duration_minutes FROM fast_logs
             ORDER BY log_time DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(to_record(row?)?);
        }
        Ok(records)
    }
}

fn to_record((id, log_time, duration_minutes): (i64, String, u64)) -> Result<FastLogRecord> {
    let log_time = DateTime::parse_from_rfc3339(&log_time)
        .map_err(|e| CoreError::Database(DatabaseError::QueryFailed(e.to_string())))?
        .with_timezone(&Utc);
    Ok(FastLogRecord {
        id,
        log_time,
        duration_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, log_time: &str, minutes: u64) -> FastLogRecord {
        FastLogRecord {
            id,
            log_time: DateTime::parse_from_rfc3339(log_time)
                .unwrap()
                .with_timezone(&Utc),
            duration_minutes: minutes,
        }
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn logs_are_listed_newest_first() {
        let db = Database::open_memory().unwrap();
        db.upsert_log(&record(1, "2026-03-01T08:00:00Z", 960)).unwrap();
        db.upsert_log(&record(2, "2026-03-02T08:00:00Z", 840)).unwrap();

        let logs = db.list_logs(10).unwrap();
        assert_eq!(logs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(db.list_logs(1).unwrap().len(), 1);
    }

    #[test]
    fn upsert_replaces_and_delete_removes() {
        let db = Database::open_memory().unwrap();
        db.upsert_log(&record(1, "2026-03-01T08:00:00Z", 960)).unwrap();
        db.upsert_log(&record(1, "2026-03-01T09:00:00Z", 900)).unwrap();

        let stored = db.get_log(1).unwrap().unwrap();
        assert_eq!(stored.duration_minutes, 900);

        assert!(db.delete_log(1).unwrap());
        assert!(!db.delete_log(1).unwrap());
        assert!(db.get_log(1).unwrap().is_none());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fasttrack.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
