//! Configuration validation
//!
//! Validates config consistency:
//! - Listener ports are non-zero and do not collide
//! - Queue, peer and history sizes are positive
//! - Alert thresholds are positive
//! - A configured secret is not empty

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::monitor::MAX_HISTORY_CAPACITY;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_ports(config)?;
    validate_server(config)?;
    validate_monitor(config)?;
    Ok(())
}

fn validate_ports(config: &Config) -> Result<()> {
    if config.server.tcp_port == 0 {
        return Err(ConfigError::invalid_value("server", "tcp_port", "must not be 0"));
    }

    if config.web.enabled {
        if config.web.port == 0 {
            return Err(ConfigError::invalid_value("web", "port", "must not be 0"));
        }
        if config.web.port == config.server.tcp_port {
            return Err(ConfigError::duplicate_port(config.web.port, "server", "web"));
        }
    }

    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.peer_queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "peer_queue_size",
            "must be greater than 0",
        ));
    }
    if server.max_peers == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "max_peers",
            "must be greater than 0",
        ));
    }
    if server.auth_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "server",
            "auth_timeout",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_monitor(config: &Config) -> Result<()> {
    if let Some(secret) = &config.auth.secret
        && secret.is_empty()
    {
        return Err(ConfigError::invalid_value("auth", "secret", "must not be empty"));
    }
    if config.auth.token_ttl.is_zero() {
        return Err(ConfigError::invalid_value(
            "auth",
            "token_ttl",
            "must be greater than 0",
        ));
    }

    if config.stats.history_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "stats",
            "history_capacity",
            "must be greater than 0",
        ));
    }
    if config.stats.history_capacity > MAX_HISTORY_CAPACITY {
        return Err(ConfigError::invalid_value(
            "stats",
            "history_capacity",
            format!(
                "must be at most {MAX_HISTORY_CAPACITY}, got {}",
                config.stats.history_capacity
            ),
        ));
    }
    if config.stats.top_k == 0 {
        return Err(ConfigError::invalid_value("stats", "top_k", "must be greater than 0"));
    }

    for (field, value) in [
        ("gc_pause_ms", config.alerts.gc_pause_ms),
        ("lock_contention_ms", config.alerts.lock_contention_ms),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::invalid_value(
                "alerts",
                field,
                format!("must be a positive number, got {value}"),
            ));
        }
    }

    Ok(())
}
