//! jtail - Live JVM telemetry tailing
//!
//! # Usage
//!
//! ```bash
//! # Run the monitor service with a synthetic feed
//! jtail serve --demo --secret s3cret
//!
//! # Feed JSON-lines events from another process
//! producer | jtail serve --feed - --secret s3cret
//!
//! # Watch the stream
//! jtail connect --secret s3cret
//!
//! # Mint a token for someone else
//! jtail token --secret s3cret --ttl 600
//! ```

mod client;
mod cmd;
mod feed;
mod format;
mod monitor;
mod tui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jtail_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// jtail - Live JVM telemetry tailing
#[derive(Parser, Debug)]
#[command(name = "jtail")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitor service (hub + HTTP surface)
    Serve(cmd::serve::ServeArgs),

    /// Print a signed access token
    Token(cmd::token::TokenArgs),

    /// Open the live terminal viewer
    Connect(cmd::connect::ConnectArgs),

    /// Download an incident bundle from a running monitor
    Bundle(cmd::bundle::BundleArgs),

    /// Print the current aggregate of a running monitor
    Stats(cmd::stats::StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(args) => {
            let log_level = resolve_log_level(cli.log_level.as_deref(), &config.log);
            init_logging(&log_level, &config.log)?;
            cmd::serve::run(args, config).await
        }
        Command::Token(args) => {
            // Token just prints to stdout
            cmd::token::run(args, &config)
        }
        Command::Connect(args) => {
            // TUI doesn't install a logger (uses alternate screen)
            cmd::connect::run(args, &config).await
        }
        Command::Bundle(args) => cmd::bundle::run(args).await,
        Command::Stats(args) => cmd::stats::run(args).await,
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let ansi = !matches!(log.output, LogOutput::File(_));
    let writer = match &log.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };

    let registry = tracing_subscriber::registry();
    let result = match log.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .with(filter)
            .try_init(),
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
