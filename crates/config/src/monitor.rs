//! Token, aggregation and alert settings

use std::time::Duration;

use serde::Deserialize;

/// Token gate configuration
///
/// ```toml
/// [auth]
/// secret = "change-me"   # omitted: a random secret is generated per run
/// token_ttl = "300s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared signing secret
    /// Default: none (ephemeral)
    pub secret: Option<String>,

    /// Lifetime of tokens minted by `jtail token`
    /// Default: 300s
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl: Duration::from_secs(300),
        }
    }
}

/// Upper bound for `stats.history_capacity`
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

/// Aggregation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Events kept in the history ring
    /// Default: 200, at most [`MAX_HISTORY_CAPACITY`]
    pub history_capacity: usize,

    /// Rows per top-K table
    /// Default: 10
    pub top_k: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            history_capacity: 200,
            top_k: 10,
        }
    }
}

/// Alert thresholds, in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Default: 500
    pub gc_pause_ms: f64,
    /// Default: 1000
    pub lock_contention_ms: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            gc_pause_ms: 500.0,
            lock_contention_ms: 1000.0,
        }
    }
}
