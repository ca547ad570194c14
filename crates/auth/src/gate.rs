//! Token issuance and verification
//!
//! HS256 via `jsonwebtoken` with zero leeway and a required `exp` claim.
//! `verify` fails closed: every decoding, signature or expiry problem is a
//! plain `false`, never an error or panic.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use crate::claims::TokenClaims;
use crate::error::{AuthError, Result};

/// Issue a token signed with `secret`, valid for `ttl_secs` seconds
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` if `secret` is empty.
pub fn issue(secret: &str, ttl_secs: u64) -> Result<String> {
    issue_with_claims(secret, &TokenClaims::expiring_in(ttl_secs))
}

/// Issue a token with explicit claims
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` if `secret` is empty.
pub fn issue_with_claims(secret: &str, claims: &TokenClaims) -> Result<String> {
    if secret.is_empty() {
        return Err(AuthError::invalid_input("secret must not be empty"));
    }

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verify a token against `secret`
///
/// True only when the token has three segments, the signature matches and
/// the expiry has not passed.
pub fn verify(token: &str, secret: &str) -> bool {
    decode_claims(token, secret).is_ok()
}

/// Decode and validate a token, returning its claims
fn decode_claims(token: &str, secret: &str) -> Result<TokenClaims> {
    if secret.is_empty() {
        return Err(AuthError::invalid_input("secret must not be empty"));
    }
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    if token.split('.').count() != 3 {
        return Err(AuthError::InvalidTokenFormat);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!(error = ?e, "token rejected");
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Utf8(_) => AuthError::InvalidTokenFormat,
            _ => AuthError::InvalidClaims(e.to_string()),
        }
    })
}

/// Generate an ephemeral secret for runs without a configured one
pub fn generate_secret() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A shared secret bound to issue/verify
///
/// Cheap to clone; services hold one instead of passing the secret around.
#[derive(Clone)]
pub struct TokenGate {
    secret: Arc<str>,
}

impl fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGate")
            .field("algorithm", &"HS256")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenGate {
    /// Create a gate for `secret`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::invalid_input("secret must not be empty"));
        }
        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    /// Create a gate with a freshly generated secret
    pub fn ephemeral() -> Self {
        Self {
            secret: Arc::from(generate_secret()),
        }
    }

    /// Issue a token valid for `ttl_secs`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Encoding` if signing fails.
    pub fn issue(&self, ttl_secs: u64) -> Result<String> {
        issue(&self.secret, ttl_secs)
    }

    /// Verify a token
    #[inline]
    pub fn verify(&self, token: &str) -> bool {
        verify(token, &self.secret)
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns the specific `AuthError` describing the rejection. Callers at a
    /// trust boundary should not echo it to the peer.
    pub fn claims(&self, token: &str) -> Result<TokenClaims> {
        decode_claims(token, &self.secret)
    }

    /// The shared secret
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
