//! jtail Protocol - Event model and line protocol
//!
//! This crate provides the types that flow between the producer, the monitor
//! service and every consumer:
//! - `Event` - One telemetry occurrence (GC pause, lock wait, exception, summary)
//! - `FieldValue` - Dynamically typed event detail, round-trips arbitrary JSON
//! - `EventCategory` - Case-insensitive classification of an event kind
//! - Line protocol helpers for the `AUTH` / `OK` / `ERR` handshake and the
//!   newline-delimited JSON event stream
//!
//! # Line Protocol
//!
//! ```text
//! client                         server
//!   │ ── AUTH <token> ──────────▶ │
//!   │ ◀───────────── OK Welcome ─ │   (or ERR <reason>, then close)
//!   │ ◀──────────── {"ts":...} ── │   one JSON event per line
//!   │ ◀──────────── {"ts":...} ── │
//! ```

mod category;
mod error;
mod event;
mod field;
pub mod line;

pub use category::EventCategory;
pub use error::ProtocolError;
pub use event::{Event, RESERVED_KEYS, SYSTEM_THREAD};
pub use field::FieldValue;
pub use line::{HandshakeReply, decode_event_line, encode_event_line, parse_auth_line};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum accepted length of a single protocol line (64KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;
