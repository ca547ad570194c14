//! HTTP client for a running monitor's query surface

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use jtail_auth::CLIENT_TOKEN_TTL_SECS;
use jtail_stats::StatsSnapshot;
use reqwest::StatusCode;

/// How a client proves itself to the monitor
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Access token, used as-is
    Token(String),
    /// Shared secret; every use mints a fresh short-lived token
    Secret(String),
}

impl Credential {
    /// Token to present right now
    pub fn token(&self) -> Result<String> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::Secret(secret) => jtail_auth::issue(secret, CLIENT_TOKEN_TTL_SECS)
                .context("failed to mint token from secret"),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(..)"),
            Self::Secret(_) => f.write_str("Secret(..)"),
        }
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

/// Authenticated client for `/jfr/*` routes
#[derive(Debug, Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl MonitorClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8080`)
    pub fn new(
        base_url: impl Into<String>,
        credential: impl Into<Credential>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: credential.into(),
        })
    }

    /// Server base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current aggregate
    pub async fn snapshot(&self) -> Result<StatsSnapshot> {
        self.get("/jfr/stats")
            .await?
            .json()
            .await
            .context("failed to parse stats response")
    }

    /// Fetch the incident bundle as raw JSON bytes
    pub async fn bundle(&self) -> Result<Vec<u8>> {
        let body = self
            .get("/jfr/bundle")
            .await?
            .bytes()
            .await
            .context("failed to read bundle body")?;
        Ok(body.to_vec())
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.credential.token()?;
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("failed to connect to {} - is the monitor running?", self.base_url))?;

        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::UNAUTHORIZED => anyhow::bail!("monitor rejected the token (401)"),
            StatusCode::NOT_FOUND => anyhow::bail!("{} is disabled on this monitor (404)", path),
            status => anyhow::bail!("request to {} failed: {}", path, status),
        }
    }
}
