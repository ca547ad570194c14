//! Broadcast hub and HTTP listener configuration

use std::time::Duration;

use serde::Deserialize;

/// Line-protocol hub configuration
///
/// # Example
///
/// ```toml
/// [server]
/// tcp_host = "0.0.0.0"
/// tcp_port = 7099
/// auth_timeout = "5s"
/// peer_queue_size = 256
/// max_peers = 100
/// require_auth = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub tcp_host: String,

    /// Port to listen on
    /// Default: 7099
    pub tcp_port: u16,

    /// Window for a new connection to send `AUTH <token>`
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub auth_timeout: Duration,

    /// Lines buffered per peer before it is dropped as lagging
    /// Default: 256
    pub peer_queue_size: usize,

    /// Maximum concurrent authenticated peers
    /// Default: 100
    pub max_peers: usize,

    /// Require a token handshake
    /// Default: true
    pub require_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tcp_host: "0.0.0.0".to_string(),
            tcp_port: 7099,
            auth_timeout: Duration::from_secs(5),
            peer_queue_size: 256,
            max_peers: 100,
            require_auth: true,
        }
    }
}

/// HTTP query surface configuration
///
/// # Example
///
/// ```toml
/// [web]
/// enabled = true
/// host = "0.0.0.0"
/// port = 8080
/// stats_enabled = true
/// dashboard_enabled = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve HTTP at all
    /// Default: true
    pub enabled: bool,

    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 8080
    pub port: u16,

    /// Serve stats, history, metrics and bundle routes
    /// Default: true
    pub stats_enabled: bool,

    /// Serve the HTML dashboard
    /// Default: true
    pub dashboard_enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8080,
            stats_enabled: true,
            dashboard_enabled: true,
        }
    }
}
