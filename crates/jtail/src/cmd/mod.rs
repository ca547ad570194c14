//! Command implementations for the jtail CLI

pub mod bundle;
pub mod connect;
pub mod serve;
pub mod stats;
pub mod token;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use jtail_config::Config;

use crate::client::Credential;

/// Config files tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["jtail.toml", "configs/jtail.toml"];

/// Load configuration
///
/// An explicit path must exist. Without one the default locations are tried
/// and built-in defaults are used if none is present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            return Config::from_file(&candidate)
                .with_context(|| format!("failed to load {}", candidate.display()));
        }
    }

    Ok(Config::default())
}

/// Credentials for commands that talk to a running monitor
///
/// A token is used as-is. A secret mints a short-lived token locally.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Shared secret (mints a 60s token)
    #[arg(short, long, env = "JTAIL_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Existing access token
    #[arg(short, long, env = "JTAIL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl CredentialArgs {
    /// The credential to use, token first
    pub fn credential(&self) -> Option<Credential> {
        match (&self.token, &self.secret) {
            (Some(token), _) => Some(Credential::Token(token.clone())),
            (None, Some(secret)) => Some(Credential::Secret(secret.clone())),
            (None, None) => None,
        }
    }

    /// Resolve to a token, if any credential was given
    pub fn resolve(&self) -> Result<Option<String>> {
        self.credential().map(|c| c.token()).transpose()
    }

    /// Resolve to a token, failing when no credential was given
    pub fn require(&self, command: &str) -> Result<String> {
        self.resolve()?.with_context(|| {
            format!("a secret (--secret) or token (--token) is required for {command}")
        })
    }
}

/// Base URL of a monitor's HTTP surface
pub fn web_base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}
