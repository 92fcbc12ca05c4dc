mod config;
pub mod database;
mod store;

pub use config::{ApiConfig, Config, FastingConfig};
pub use database::Database;
pub use store::{MemoryStore, TrackStore};

use std::path::PathBuf;

/// Returns the fasttrack data directory, creating it if needed.
///
/// `FASTTRACK_DATA_DIR` wins outright. Otherwise `~/.config/fasttrack`, or
/// `~/.config/fasttrack-dev` when `FASTTRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FASTTRACK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FASTTRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fasttrack-dev")
            } else {
                base_dir.join("fasttrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
