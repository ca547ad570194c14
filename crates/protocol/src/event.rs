//! The telemetry event model
//!
//! An `Event` is one observed occurrence reported by the producer. The JSON
//! form uses short keys so a line on the wire looks like:
//!
//! ```text
//! {"ts":"2026-01-01T12:00:00Z","pid":4242,"event":"jdk.GarbageCollection",
//!  "thread":"System","duration_ms":12.5,"fields":{"name":"G1New"}}
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::EventCategory;
use crate::error::ProtocolError;
use crate::field::FieldValue;

/// Thread name used for events not associated with a thread
pub const SYSTEM_THREAD: &str = "System";

/// Keys modelled as top-level attributes; never present in `fields`
pub const RESERVED_KEYS: [&str; 5] = ["ts", "pid", "event", "thread", "duration_ms"];

/// One telemetry occurrence
///
/// Invariants: `kind` is non-empty and `fields` holds none of
/// [`RESERVED_KEYS`]. Both hold for every constructed or decoded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct Event {
    #[serde(rename = "ts")]
    timestamp: DateTime<Utc>,

    #[serde(rename = "pid")]
    process_id: u64,

    #[serde(rename = "event")]
    kind: String,

    #[serde(rename = "thread")]
    thread_name: String,

    #[serde(rename = "duration_ms", skip_serializing_if = "Option::is_none")]
    duration_ms: Option<f64>,

    fields: BTreeMap<String, FieldValue>,
}

impl Event {
    /// Create an event of the given kind, stamped now
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::EmptyKind` if `kind` is blank.
    pub fn new(kind: impl Into<String>) -> Result<Self, ProtocolError> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(ProtocolError::EmptyKind);
        }

        Ok(Self {
            timestamp: Utc::now(),
            process_id: std::process::id() as u64,
            kind,
            thread_name: SYSTEM_THREAD.to_string(),
            duration_ms: None,
            fields: BTreeMap::new(),
        })
    }

    /// Set the producer timestamp
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the observed process ID
    #[must_use]
    pub fn with_pid(mut self, pid: u64) -> Self {
        self.process_id = pid;
        self
    }

    /// Set the thread name
    #[must_use]
    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread_name = thread.into();
        self
    }

    /// Set the measured duration in milliseconds
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add a detail field
    ///
    /// Reserved keys are ignored.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Producer-assigned timestamp
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Observed process ID
    #[inline]
    pub fn process_id(&self) -> u64 {
        self.process_id
    }

    /// Event type tag
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Thread name, or [`SYSTEM_THREAD`]
    #[inline]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Thread name, unless this is a non-thread event
    pub fn thread(&self) -> Option<&str> {
        if self.thread_name.is_empty() || self.thread_name == SYSTEM_THREAD {
            None
        } else {
            Some(&self.thread_name)
        }
    }

    /// Measured duration in milliseconds, if any
    #[inline]
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration_ms
    }

    /// All detail fields
    #[inline]
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Look up one detail field
    #[inline]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Classify this event by its kind
    #[inline]
    pub fn category(&self) -> EventCategory {
        EventCategory::classify(&self.kind)
    }

    /// Exception class name carried by an exception event
    pub fn exception_class(&self) -> Option<&str> {
        ["thrownClass", "className", "class"]
            .iter()
            .find_map(|key| self.field(key).and_then(FieldValue::as_str))
    }

    /// Kind without the `jdk.` namespace, for display
    pub fn short_kind(&self) -> &str {
        self.kind.strip_prefix("jdk.").unwrap_or(&self.kind)
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Wire form accepted on decode, before invariants are enforced
#[derive(Deserialize)]
struct RawEvent {
    #[serde(default = "Utc::now")]
    ts: DateTime<Utc>,
    #[serde(default)]
    pid: u64,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    thread: Option<String>,
    #[serde(default)]
    duration_ms: Option<f64>,
    #[serde(default)]
    fields: Option<BTreeMap<String, FieldValue>>,
}

impl TryFrom<RawEvent> for Event {
    type Error = ProtocolError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let kind = raw.event.unwrap_or_default();
        if kind.trim().is_empty() {
            return Err(ProtocolError::EmptyKind);
        }

        let mut fields = raw.fields.unwrap_or_default();
        fields.retain(|key, _| !is_reserved(key));

        Ok(Self {
            timestamp: raw.ts,
            process_id: raw.pid,
            kind,
            thread_name: raw
                .thread
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| SYSTEM_THREAD.to_string()),
            duration_ms: raw.duration_ms,
            fields,
        })
    }
}
