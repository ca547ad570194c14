//! Test utilities for minting tokens
//!
//! These produce real signed tokens so tests exercise the actual
//! verification path instead of mocking it.

use crate::claims::{DEFAULT_ROLE, TokenClaims};
use crate::gate::issue_with_claims;

/// Secret used across tests
pub const TEST_SECRET: &str = "s3cret";

/// A token for [`TEST_SECRET`] valid for one minute
pub fn valid_token() -> String {
    token_expiring_at(TEST_SECRET, chrono::Utc::now().timestamp() + 60)
}

/// A token for `secret` that expired `secs_ago` seconds ago
pub fn expired_token(secret: &str, secs_ago: i64) -> String {
    token_expiring_at(secret, chrono::Utc::now().timestamp() - secs_ago)
}

/// A token for `secret` with an explicit expiry timestamp
///
/// Returns an empty string if `secret` is empty, which every verifier
/// rejects.
pub fn token_expiring_at(secret: &str, expires_at: i64) -> String {
    let claims = TokenClaims {
        expires_at,
        role: DEFAULT_ROLE.to_string(),
    };
    issue_with_claims(secret, &claims).unwrap_or_default()
}
