//! Token command - Print a signed access token

use anyhow::{Context, Result};
use clap::Args;
use jtail_config::Config;

/// Token command arguments
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Shared secret the monitor was started with
    #[arg(short, long, env = "JTAIL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Lifetime in seconds (defaults to [auth] token_ttl)
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,
}

/// Run the token command
pub fn run(args: TokenArgs, config: &Config) -> Result<()> {
    println!("{}", mint(&args, config)?);
    Ok(())
}

fn mint(args: &TokenArgs, config: &Config) -> Result<String> {
    let ttl = args.ttl.unwrap_or_else(|| config.auth.token_ttl.as_secs());
    if ttl == 0 {
        anyhow::bail!("--ttl must be greater than 0");
    }

    jtail_auth::issue(&args.secret, ttl).context("failed to issue token")
}
