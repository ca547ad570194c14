//! Authentication error types

use thiserror::Error;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur when issuing or inspecting tokens
#[derive(Debug, Error)]
pub enum AuthError {
    /// Caller supplied unusable input (empty secret)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Token could not be signed
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token is missing or empty
    #[error("missing token")]
    MissingToken,

    /// Token is not three base64url segments
    #[error("invalid token format")]
    InvalidTokenFormat,

    /// Signature does not match the secret
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token claims are missing or malformed
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
}

impl AuthError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
