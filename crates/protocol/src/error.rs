//! Protocol error types
//!
//! Errors that can occur when parsing handshake lines or event lines.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// First line was not a well-formed `AUTH <token>` request
    #[error("invalid handshake: {0}")]
    InvalidHandshake(String),

    /// `AUTH` line carried no token
    #[error("missing token in AUTH line")]
    MissingToken,

    /// Server reply did not start with `OK` or `ERR`
    #[error("unexpected server reply: {0}")]
    UnexpectedReply(String),

    /// Event kind is missing or empty
    #[error("event kind must not be empty")]
    EmptyKind,

    /// Line exceeds the maximum accepted length
    #[error("line too long: {size} bytes exceeds maximum {max}")]
    LineTooLong { size: usize, max: usize },

    /// Event JSON could not be encoded or decoded
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Create an invalid handshake error
    #[inline]
    pub fn invalid_handshake(msg: impl Into<String>) -> Self {
        Self::InvalidHandshake(msg.into())
    }

    /// Create a line too long error
    #[inline]
    pub fn line_too_long(size: usize, max: usize) -> Self {
        Self::LineTooLong { size, max }
    }
}
