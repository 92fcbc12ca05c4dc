pub mod config;
pub mod fast;
pub mod history;

use chrono::NaiveTime;
use fasttrack_core::{ApiError, Config, CoreError};

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("expected HH:MM or HH:MM:SS, got '{s}'"))
}

/// A 401 ends the session: drop the stored token so the user signs in again.
pub fn sign_out_if_unauthorized(err: &CoreError, config: &mut Config) {
    if matches!(err, CoreError::Api(ApiError::Unauthorized)) {
        tracing::warn!("log API rejected the session token, signing out");
        if let Err(e) = config.sign_out() {
            tracing::warn!(error = %e, "failed to clear stored token");
        }
        eprintln!("session expired: set a new token with `fasttrack config set api.token <TOKEN>`");
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
