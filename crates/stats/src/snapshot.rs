//! Point-in-time aggregate view
//!
//! Serialized as the `/jfr/stats` response body and deserialized again by the
//! terminal consumer, so every type here round-trips through JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jtail_protocol::Event;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Scalar counter block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub total_events: u64,
    pub gc_count: u64,
    pub lock_count: u64,
    pub exception_count: u64,
    pub heap_used_bytes: u64,
    pub heap_committed_bytes: u64,
    /// Derived from `heap_used_bytes`
    pub heap_used_mb: u64,
    /// Derived from `heap_committed_bytes`
    pub heap_committed_mb: u64,
    pub last_gc_pause_ms: f64,
}

impl Counters {
    /// Fill the derived megabyte fields from the byte counters
    pub fn with_derived(mut self) -> Self {
        self.heap_used_mb = self.heap_used_bytes / BYTES_PER_MB;
        self.heap_committed_mb = self.heap_committed_bytes / BYTES_PER_MB;
        self
    }

    /// Flat `name value` pairs in exposition order
    pub fn exposition(&self) -> Vec<(&'static str, String)> {
        vec![
            ("jfrtail_events_total", self.total_events.to_string()),
            ("jfrtail_gc_count", self.gc_count.to_string()),
            ("jfrtail_gc_pause_ms", self.last_gc_pause_ms.to_string()),
            ("jfrtail_exceptions_count", self.exception_count.to_string()),
            ("jfrtail_locks_count", self.lock_count.to_string()),
            ("jfrtail_heap_used_bytes", self.heap_used_bytes.to_string()),
            (
                "jfrtail_heap_committed_bytes",
                self.heap_committed_bytes.to_string(),
            ),
        ]
    }
}

/// One row of a top-K table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEntry<V> {
    pub name: String,
    pub value: V,
}

impl<V> From<(String, V)> for TopEntry<V> {
    fn from((name, value): (String, V)) -> Self {
        Self { name, value }
    }
}

/// Immutable copy of the aggregate
///
/// Owns all of its data; mutating the aggregator afterwards never changes a
/// snapshot already taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// When the snapshot was assembled
    pub timestamp: DateTime<Utc>,

    pub metrics: Counters,

    /// Event count per kind
    #[serde(default)]
    pub event_counts: BTreeMap<String, u64>,

    /// Exception class → occurrences, descending
    #[serde(default)]
    pub top_exceptions: Vec<TopEntry<u64>>,

    /// Thread → cumulative blocked milliseconds, descending
    #[serde(default)]
    pub top_blocked_threads: Vec<TopEntry<f64>>,

    #[serde(default)]
    pub last_event: Option<Event>,

    /// Recent events, oldest first
    #[serde(default)]
    pub history: Vec<Event>,
}

impl StatsSnapshot {
    /// An empty snapshot stamped now
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            metrics: Counters::default(),
            event_counts: BTreeMap::new(),
            top_exceptions: Vec::new(),
            top_blocked_threads: Vec::new(),
            last_event: None,
            history: Vec::new(),
        }
    }
}
