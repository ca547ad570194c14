//! jtail Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//! Command-line flags override whatever is loaded here.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use jtail_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\ntcp_port = 7199").unwrap();
//! assert_eq!(config.server.tcp_port, 7199);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! tcp_port = 7099
//! auth_timeout = "5s"
//!
//! [web]
//! port = 8080
//!
//! [auth]
//! secret = "change-me"
//!
//! [stats]
//! history_capacity = 200
//!
//! [alerts]
//! gc_pause_ms = 500
//!
//! [log]
//! level = "info"
//! ```

mod error;
mod logging;
mod monitor;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use monitor::{AlertsConfig, AuthConfig, MAX_HISTORY_CAPACITY, StatsConfig};
pub use server::{ServerConfig, WebConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line-protocol hub
    pub server: ServerConfig,

    /// HTTP query surface
    pub web: WebConfig,

    /// Token signing
    pub auth: AuthConfig,

    /// Aggregation sizes
    pub stats: StatsConfig,

    /// Alert thresholds
    pub alerts: AlertsConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Hub listen address as `host:port`
    pub fn tcp_addr(&self) -> String {
        format!("{}:{}", self.server.tcp_host, self.server.tcp_port)
    }

    /// HTTP listen address as `host:port`
    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
