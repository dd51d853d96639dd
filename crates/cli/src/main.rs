//! Dashboard CLI - admin console for the dashboard REST API

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use crate::commands::Commands;
use crate::config::CliConfig;
use dashboard_core::FileTokenStore;
use dashboard_http::{ApiClient, ClientError, SessionEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Manage dashboard users and products from the command line")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for credentials and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL of the API, overrides the configuration file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }
    let data_dir = config.data_dir();

    logging::init_logging(cli.log_level.into(), &config.log, &data_dir)?;
    debug!(
        base_url = %config.api.base_url,
        data_dir = %data_dir.display(),
        "Starting dashboard CLI"
    );

    let client = ApiClient::builder()
        .config(&config.api)
        .token_store(Arc::new(FileTokenStore::in_dir(&data_dir)))
        .build()?;
    let mut events = client.session().subscribe();

    let result = cli.command.execute(&client).await;
    report_session_events(&mut events);

    if let Err(e) = result {
        error!("Command failed: {e:#}");
        match e.downcast_ref::<ClientError>() {
            Some(ClientError::SessionExpired) => {}
            Some(client_error) => eprintln!("{}", client_error.user_message()),
            None => eprintln!("{e:#}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Act on session events raised while the command ran
fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::SignedIn { user, redirect_to }) => {
                eprintln!(
                    "Signed in as {} ({}), continue at {redirect_to}",
                    user.name, user.email
                );
            }
            Ok(SessionEvent::Refreshed) => debug!("Credentials were refreshed"),
            Ok(SessionEvent::SignedOut) => eprintln!("Signed out"),
            Ok(SessionEvent::LoginRequired) => {
                eprintln!("Login required. Run `dashboard login <email>` to sign in.");
            }
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "Missed session events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
