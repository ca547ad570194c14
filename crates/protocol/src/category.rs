//! Event kind classification
//!
//! Matching is a case-insensitive substring test against the kind, so both
//! `jdk.GarbageCollection` and a producer's own `GcPause` land in the GC
//! bucket. Heap summaries are checked first because their kinds usually
//! contain `GC` as well (`jdk.GCHeapSummary`).

use std::fmt;

use serde::Serialize;

/// Coarse category of an event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Periodic heap usage summary
    HeapSummary,
    /// Garbage collection pause or phase
    Gc,
    /// Monitor contention, wait or thread park
    Lock,
    /// Exception or error thrown
    Exception,
    /// Anything else (CPU load, allocation samples, ...)
    Other,
}

impl EventCategory {
    /// Classify an event kind
    pub fn classify(kind: &str) -> Self {
        let kind = kind.to_ascii_lowercase();

        if kind.contains("heapsummary") {
            Self::HeapSummary
        } else if kind.contains("garbagecollection") || kind.contains("gc") {
            Self::Gc
        } else if kind.contains("javamonitor")
            || kind.contains("threadpark")
            || kind.contains("lock")
            || kind.contains("park")
        {
            Self::Lock
        } else if kind.contains("exception") || kind.contains("throw") {
            Self::Exception
        } else {
            Self::Other
        }
    }

    /// Short label for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeapSummary => "heap",
            Self::Gc => "gc",
            Self::Lock => "lock",
            Self::Exception => "exception",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
