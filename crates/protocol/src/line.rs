//! Line protocol encoding and decoding
//!
//! Every message is one UTF-8 line terminated by `\n`. Helpers here accept
//! lines with or without the trailing `\r\n` / `\n`.

use crate::error::ProtocolError;
use crate::event::Event;
use crate::{MAX_LINE_LENGTH, Result};

/// Client handshake command
pub const AUTH_COMMAND: &str = "AUTH";

/// Server reply prefix on success
pub const OK_PREFIX: &str = "OK";

/// Server reply prefix on failure
pub const ERR_PREFIX: &str = "ERR";

/// Greeting sent after a successful handshake
pub const WELCOME: &str = "Welcome";

/// Reason sent when the first line is not `AUTH <token>`
pub const REASON_AUTH_REQUIRED: &str = "Auth Required";

/// Reason sent when the token fails verification
pub const REASON_INVALID_TOKEN: &str = "Invalid Token";

/// Reason sent when no handshake arrives in time
pub const REASON_AUTH_TIMEOUT: &str = "Auth Timeout";

/// Reason sent when the hub has no room for another peer
pub const REASON_HUB_FULL: &str = "Too Many Connections";

/// Strip a trailing line terminator
#[inline]
pub fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Parse the client's first line, returning the token
///
/// # Errors
///
/// - `InvalidHandshake` if the line is not an `AUTH` command
/// - `MissingToken` if the command has no token
pub fn parse_auth_line(line: &str) -> Result<&str> {
    let line = trim_line(line);
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

    if command != AUTH_COMMAND {
        return Err(ProtocolError::invalid_handshake(truncate(line, 32)));
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(ProtocolError::MissingToken);
    }

    Ok(token)
}

/// Format the client's `AUTH` line, terminator included
pub fn format_auth_line(token: &str) -> String {
    format!("{AUTH_COMMAND} {token}\n")
}

/// Server response to a handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeReply {
    /// Authenticated; message is informational
    Ok(String),
    /// Rejected; the server closes the connection after sending this
    Err(String),
}

impl HandshakeReply {
    /// The standard success reply
    pub fn welcome() -> Self {
        Self::Ok(WELCOME.to_string())
    }

    /// A rejection with the given reason
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Err(reason.into())
    }

    /// Check if this reply accepts the connection
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Encode as a line, terminator included
    pub fn encode(&self) -> String {
        match self {
            Self::Ok(msg) => format!("{OK_PREFIX} {msg}\n"),
            Self::Err(reason) => format!("{ERR_PREFIX} {reason}\n"),
        }
    }

    /// Parse a server reply line
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedReply` unless the first word is exactly `OK` or `ERR`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = trim_line(line);
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let message = rest.trim_start().to_string();

        match word {
            OK_PREFIX => Ok(Self::Ok(message)),
            ERR_PREFIX => Ok(Self::Err(message)),
            _ => Err(ProtocolError::UnexpectedReply(truncate(line, 64))),
        }
    }
}

/// Serialize an event as one protocol line, terminator included
///
/// # Errors
///
/// Returns `Json` if the event cannot be serialized (non-finite floats).
pub fn encode_event_line(event: &Event) -> Result<String> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Decode one protocol line into an event
///
/// # Errors
///
/// - `LineTooLong` if the line exceeds [`MAX_LINE_LENGTH`]
/// - `Json` / `EmptyKind` if the line is not a valid event
pub fn decode_event_line(line: &str) -> Result<Event> {
    let line = trim_line(line);
    if line.len() > MAX_LINE_LENGTH {
        return Err(ProtocolError::line_too_long(line.len(), MAX_LINE_LENGTH));
    }

    serde_json::from_str(line).map_err(|e| {
        // try_from failures surface as serde errors; keep the typed variant
        if e.to_string().contains("event kind must not be empty") {
            ProtocolError::EmptyKind
        } else {
            ProtocolError::Json(e)
        }
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
