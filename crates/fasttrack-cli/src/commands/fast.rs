use std::sync::Arc;

use chrono::NaiveTime;
use clap::Subcommand;
use fasttrack_core::{
    AppLifecycle, Config, Database, Event, FastingSession, HttpLogClient, SystemClock,
};
use tokio::sync::watch;

use super::{parse_time_of_day, print_json, sign_out_if_unauthorized};

#[derive(Subcommand)]
pub enum FastAction {
    /// Start a fast
    Start {
        /// Clock time the fast began today (HH:MM[:SS]); defaults to now
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
        /// Target length in hours; defaults to the configured length
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Pause the running fast
    Pause,
    /// Resume a paused fast
    Resume,
    /// Clear a paused or completed fast
    Reset {
        /// Also abandon a fast that is still running
        #[arg(long)]
        force: bool,
    },
    /// Print current fast state as JSON
    Status,
    /// Submit the fast to the health log and clear it
    Log {
        /// Clock time to log the fast at (HH:MM[:SS]); defaults to now
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
    },
    /// Change the default target length (only with no fast in progress)
    Limit {
        /// Target length in hours
        hours: u32,
    },
    /// Follow the running fast, one event per second
    Watch,
}

type CliSession = FastingSession<Database, HttpLogClient>;

fn open_session(
    config: &Config,
    lifecycle: watch::Receiver<AppLifecycle>,
) -> Result<CliSession, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let api = HttpLogClient::new(&config.api.base_url, config.api_token())?;
    let session = FastingSession::open(
        db,
        api,
        Arc::new(SystemClock),
        lifecycle,
        config.default_limit_secs(),
    )?;
    Ok(session)
}

fn hours_to_secs(hours: u32) -> u64 {
    u64::from(hours) * 3600
}

pub async fn run(action: FastAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    // Every invocation is the app coming to the foreground.
    let (lifecycle_tx, lifecycle_rx) = watch::channel(AppLifecycle::Foreground);
    let mut session = open_session(&config, lifecycle_rx)?;

    match action {
        FastAction::Start { at, hours } => {
            let limit_secs = match hours {
                Some(hours) => hours_to_secs(hours),
                None => session.track().limit_secs(),
            };
            print_json(&session.start(at, limit_secs)?)?;
        }
        FastAction::Pause => print_json(&session.pause()?)?,
        FastAction::Resume => print_json(&session.resume()?)?,
        FastAction::Reset { force } => {
            let event = if force {
                session.abandon()?
            } else {
                session.reset()?
            };
            print_json(&event)?;
        }
        FastAction::Status => print_json(&session.snapshot())?,
        FastAction::Log { at } => match session.log(at).await {
            Ok((record, event)) => {
                print_json(&event)?;
                print_json(&record)?;
            }
            Err(err) => {
                sign_out_if_unauthorized(&err, &mut config);
                return Err(err.into());
            }
        },
        FastAction::Limit { hours } => {
            let event = session.set_limit(hours_to_secs(hours))?;
            config.set("fasting.default_limit_hours", &hours.to_string())?;
            print_json(&event)?;
        }
        FastAction::Watch => watch_session(&mut session, &lifecycle_tx).await?,
    }
    Ok(())
}

async fn watch_session(
    session: &mut CliSession,
    lifecycle: &watch::Sender<AppLifecycle>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&session.snapshot())?;
    loop {
        let next = tokio::select! {
            event = session.next_event() => Some(event),
            _ = tokio::signal::ctrl_c() => None,
        };
        match next {
            Some(Some(event)) => {
                println!("{}", serde_json::to_string(&event)?);
                if event.is_completion() {
                    break;
                }
            }
            Some(None) => break,
            None => {
                // Leaving: stop display ticks and let the suspension persist.
                lifecycle.send_replace(AppLifecycle::Background);
                while let Some(event) = session.next_event().await {
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, Event::TickingSuspended { .. }) || event.is_completion() {
                        break;
                    }
                }
                break;
            }
        }
    }
    Ok(())
}
