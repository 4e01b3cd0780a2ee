//! scribe - command-line client for the session endpoints
//!
//! Operator tool for poking a backend by hand:
//! - `scribe status <unit> [--watch]`: is anyone editing the unit?
//! - `scribe release <unit>`: force-release a stuck lock (tokenless cancel)
//! - `scribe submit <unit> <page> --text ...`: lock, submit one page, release

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scribe_common::api::CancelRequest;
use scribe_common::config::TomlConfig;
use scribe_common::events::EventBus;
use scribe_common::logging::init_tracing;
use scribe_session::{
    ConcurrencyIndicator, ContributorInfo, HttpBackend, PageFields, SessionBackend,
    SessionCoordinator, SubmitPayload,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Transcription session client")]
#[command(version)]
struct Args {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show whether a unit has an ongoing session
    Status {
        unit_id: String,

        /// Keep polling and print every change until Ctrl+C
        #[arg(long)]
        watch: bool,
    },

    /// Release a unit's lock without a token
    Release { unit_id: String },

    /// Lock a unit, submit one page and release the lock
    Submit {
        unit_id: String,

        /// Page image source, e.g. `ULMA1234_0001.jpg`
        page_source: String,

        #[arg(long)]
        text: String,

        #[arg(long, default_value = "")]
        comment: String,

        /// Defaults to the number embedded in the page source
        #[arg(long)]
        page_number: Option<String>,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_backend_override(args.backend_url.as_deref());
    init_tracing(&config.logging.level);

    let backend = HttpBackend::from_config(&config.client)
        .context("Failed to create backend client")?;
    info!(backend = %backend.base_url(), "Using backend");
    let backend: Arc<dyn SessionBackend> = Arc::new(backend);

    match args.command {
        Command::Status {
            unit_id,
            watch: true,
        } => {
            let events = Arc::new(EventBus::new(config.client.event_bus_capacity));
            let coordinator = Arc::new(SessionCoordinator::new(backend, events));
            let indicator = Arc::new(ConcurrencyIndicator::new(coordinator));

            let mut last = indicator.read(&unit_id).await.server_has_ongoing_session;
            print_status(&unit_id, last);

            let interval = config.client.status_poll_interval();
            info!(unit_id = %unit_id, interval_secs = interval.as_secs(), "Watching session status");
            let cancel = CancellationToken::new();
            let mut flags = indicator.watch(unit_id.clone(), interval, cancel.clone());

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    _ = &mut ctrl_c => break,
                    changed = flags.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let ongoing = flags.borrow_and_update().server_has_ongoing_session;
                        if ongoing != last {
                            print_status(&unit_id, ongoing);
                            last = ongoing;
                        }
                    }
                }
            }
            cancel.cancel();
        }
        Command::Status {
            unit_id,
            watch: false,
        } => {
            let status = backend
                .session_status(&unit_id)
                .await
                .context("Status request failed")?;
            print_status(&unit_id, status.server_has_ongoing_session);
        }
        Command::Release { unit_id } => {
            backend
                .cancel(&CancelRequest {
                    unit_id: unit_id.clone(),
                    token: None,
                })
                .await
                .context("Release failed")?;
            println!("{unit_id}: released");
        }
        Command::Submit {
            unit_id,
            page_source,
            text,
            comment,
            page_number,
            name,
            email,
        } => {
            let events = Arc::new(EventBus::new(config.client.event_bus_capacity));
            let coordinator = SessionCoordinator::new(backend, events);

            let page_number = page_number
                .or_else(|| scribe_session::page::page_number_from_source(&page_source))
                .unwrap_or_default();
            let payload = SubmitPayload {
                unit_id: unit_id.clone(),
                page_source,
                fields: PageFields {
                    text,
                    comment,
                    page_number,
                    ..PageFields::default()
                },
                contributor: ContributorInfo { name, email },
            };
            // Fail before taking the lock
            payload.validate()?;

            coordinator.start(&unit_id).await?;
            let result = coordinator.try_send(&payload).await;
            coordinator.cancel(&unit_id).await;

            if let Err(e) = result {
                bail!("Submit failed: {e}");
            }
            println!("{unit_id}: {} submitted", payload.page_source);
        }
    }

    Ok(())
}

fn print_status(unit_id: &str, ongoing: bool) {
    if ongoing {
        println!("{unit_id}: someone is editing");
    } else {
        println!("{unit_id}: free");
    }
}
