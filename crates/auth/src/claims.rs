//! Token claims

use serde::{Deserialize, Serialize};

/// Role embedded in every issued token
pub const DEFAULT_ROLE: &str = "admin";

/// Claims carried in the token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp, seconds)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Granted role
    #[serde(rename = "role", default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl TokenClaims {
    /// Claims expiring `ttl_secs` from now
    pub fn expiring_in(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            expires_at: chrono::Utc::now().timestamp().saturating_add(ttl),
            role: default_role(),
        }
    }

    /// Check if the token has expired
    ///
    /// A token is still valid during its expiry second.
    pub fn is_expired(&self) -> bool {
        self.expires_at < chrono::Utc::now().timestamp()
    }

    /// Seconds until expiry (negative once expired)
    pub fn remaining_secs(&self) -> i64 {
        self.expires_at - chrono::Utc::now().timestamp()
    }
}
