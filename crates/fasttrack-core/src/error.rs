//! Core error types for fasttrack-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! failures are rejected before any state changes; API failures leave the
//! tracker untouched so the caller can retry.

use std::path::PathBuf;
use thiserror::Error;

use crate::tracker::TrackState;

/// Core error type for fasttrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Log API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Rejected tracker commands. None of these mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Resolved start (or log) time lies after the current time
    #[error("Requested time {requested} is in the future")]
    FutureTime {
        requested: chrono::DateTime<chrono::Utc>,
    },

    /// Target duration cannot change while a fast is being tracked
    #[error("Fast length cannot be changed while tracking")]
    LimitLockedWhileTracking,

    /// Target duration must be positive
    #[error("Fast length must be greater than zero seconds")]
    InvalidLimit,

    /// Command not permitted from the current state
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: TrackState,
    },
}

/// Errors from the remote fast-log API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 from the server; the session token is no longer valid
    #[error("Not authenticated with the log API")]
    Unauthorized,

    /// Any other non-success status
    #[error("Log API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or decoding failure
    #[error("Log API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Base URL could not be parsed or joined
    #[error("Invalid log API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No base URL configured
    #[error("Log API is not configured")]
    NotConfigured,
}

impl ApiError {
    /// Status code carried by the failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_state() {
        let err = ValidationError::InvalidTransition {
            action: "pause",
            state: TrackState::Empty,
        };
        assert_eq!(err.to_string(), "Cannot pause while empty");
    }

    #[test]
    fn api_error_exposes_status() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        let err = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(ApiError::NotConfigured.status(), None);
    }

    #[test]
    fn core_error_wraps_validation() {
        let err: CoreError = ValidationError::InvalidLimit.into();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidLimit)));
    }
}
