//! Logged fasts: list the local copy, edit or delete on the server.

use chrono::NaiveTime;
use clap::Subcommand;
use fasttrack_core::tracker::resolve_time_of_day;
use fasttrack_core::{
    Clock, Config, CoreError, Database, FastLogApi, FastLogRequest, HttpLogClient, SystemClock,
};

use super::{parse_time_of_day, print_json, sign_out_if_unauthorized};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List logged fasts, newest first
    List {
        /// Maximum number of entries
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Change the duration or time of a logged fast
    Edit {
        /// Log id as returned by the server
        id: i64,
        /// New duration in minutes
        #[arg(long)]
        minutes: u64,
        /// New clock time today (HH:MM[:SS]); defaults to the stored time
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
    },
    /// Delete a logged fast
    Delete {
        /// Log id as returned by the server
        id: i64,
    },
}

pub async fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            print_json(&db.list_logs(limit)?)?;
        }
        HistoryAction::Edit { id, minutes, at } => {
            let log_time = match at {
                Some(at) => resolve_time_of_day(SystemClock.now(), at),
                None => db
                    .get_log(id)?
                    .map(|record| record.log_time)
                    .ok_or_else(|| format!("log {id} is not in local history; pass --at"))?,
            };
            let request = FastLogRequest {
                log_time,
                duration_minutes: minutes,
            };
            let api = HttpLogClient::new(&config.api.base_url, config.api_token())?;
            match api.update_fast_log(id, &request).await {
                Ok(record) => {
                    db.upsert_log(&record)?;
                    print_json(&record)?;
                }
                Err(err) => {
                    let err = CoreError::from(err);
                    sign_out_if_unauthorized(&err, &mut config);
                    return Err(err.into());
                }
            }
        }
        HistoryAction::Delete { id } => {
            let api = HttpLogClient::new(&config.api.base_url, config.api_token())?;
            if let Err(err) = api.delete_fast_log(id).await {
                let err = CoreError::from(err);
                sign_out_if_unauthorized(&err, &mut config);
                return Err(err.into());
            }
            db.delete_log(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}
