//! Connect command - Live terminal viewer
//!
//! Tails a hub's event stream in a full-screen TUI, optionally recording
//! every line and polling the monitor's `/jfr/stats` for the metrics panel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use jtail_config::Config;
use jtail_stats::AlertThresholds;
use tokio::fs::{File, OpenOptions};

use crate::client::MonitorClient;
use crate::cmd::CredentialArgs;
use crate::tui::{App, AppOptions, POLL_TIMEOUT};

/// Connect command arguments
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Hub host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Hub TCP port
    #[arg(long, default_value_t = 7099)]
    pub port: u16,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Append every received line to this JSONL file
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Monitor HTTP base URL for the metrics panel (e.g. http://localhost:8080)
    #[arg(long)]
    pub metrics_url: Option<String>,
}

/// Run the connect command
pub async fn run(args: ConnectArgs, config: &Config) -> Result<()> {
    let options = build_options(args, config).await?;
    App::new(options)?.run().await
}

async fn build_options(args: ConnectArgs, config: &Config) -> Result<AppOptions> {
    let credential = args.credentials.credential();

    let metrics = match args.metrics_url {
        Some(url) => {
            let credential = credential
                .clone()
                .context("a secret (--secret) or token (--token) is required for --metrics-url")?;
            Some(MonitorClient::new(url, credential, POLL_TIMEOUT)?)
        }
        None => None,
    };

    let record = match &args.record {
        Some(path) => Some(open_record(path).await?),
        None => None,
    };

    Ok(AppOptions {
        addr: format!("{}:{}", args.host, args.port),
        credential,
        record,
        metrics,
        thresholds: AlertThresholds {
            gc_pause_ms: config.alerts.gc_pause_ms,
            lock_contention_ms: config.alerts.lock_contention_ms,
        },
    })
}

async fn open_record(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open record file {}", path.display()))
}
