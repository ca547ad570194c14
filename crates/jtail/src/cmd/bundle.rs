//! Bundle command - Download an incident bundle
//!
//! Fetches `/jfr/bundle` from a running monitor and writes it to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::client::MonitorClient;
use crate::cmd::{CredentialArgs, web_base_url};

/// Bundle command arguments
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Monitor host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Monitor HTTP port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Output file
    #[arg(short, long, default_value = "jfr-bundle.json")]
    pub output: PathBuf,
}

/// Run the bundle command
pub async fn run(args: BundleArgs) -> Result<()> {
    let token = args.credentials.require("bundle")?;
    let client = MonitorClient::new(
        web_base_url(&args.host, args.port),
        token,
        Duration::from_secs(5),
    )?;

    let body = client.bundle().await?;
    write_bundle(&args.output, &body)?;

    println!("Bundle saved to: {}", args.output.display());
    Ok(())
}

fn write_bundle(path: &Path, body: &[u8]) -> Result<()> {
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}
