//! Remote fast-log API.
//!
//! The tracker only produces [`FastLogRequest`]s; sending them is the job of
//! a [`FastLogApi`] implementation, normally [`HttpLogClient`].

mod http;

pub use http::HttpLogClient;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of a create/update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastLogRequest {
    pub log_time: DateTime<Utc>,
    pub duration_minutes: u64,
}

/// A fast log as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastLogRecord {
    pub id: i64,
    pub log_time: DateTime<Utc>,
    pub duration_minutes: u64,
}

pub trait FastLogApi {
    fn create_fast_log(
        &self,
        request: &FastLogRequest,
    ) -> impl Future<Output = Result<FastLogRecord, ApiError>> + Send;

    fn update_fast_log(
        &self,
        id: i64,
        request: &FastLogRequest,
    ) -> impl Future<Output = Result<FastLogRecord, ApiError>> + Send;

    fn delete_fast_log(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;
}
