//! Running aggregate over the event stream
//!
//! `accept` is called once per ingested event from any producer thread.
//! Snapshots may be taken concurrently with ingestion.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;

use jtail_protocol::{Event, EventCategory};

use crate::history::HistoryBuffer;
use crate::snapshot::{Counters, StatsSnapshot, TopEntry};
use crate::top::TopTable;

/// Default history capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Default number of rows reported per top-K table
pub const DEFAULT_TOP_K: usize = 10;

/// Keyed state guarded together
#[derive(Debug, Default)]
struct Tables {
    last_event: Option<Event>,
    event_counts: BTreeMap<String, u64>,
    exceptions: TopTable<u64>,
    blocked_threads: TopTable<f64>,
}

/// Thread-safe event aggregate
#[derive(Debug)]
pub struct StatsAggregator {
    total_events: AtomicU64,
    gc_count: AtomicU64,
    lock_count: AtomicU64,
    exception_count: AtomicU64,
    heap_used_bytes: AtomicU64,
    heap_committed_bytes: AtomicU64,
    /// `f64` bit pattern
    last_gc_pause_bits: AtomicU64,

    history: HistoryBuffer,
    tables: Mutex<Tables>,
    top_k: usize,
}

impl StatsAggregator {
    /// Create an aggregator keeping `history_capacity` recent events
    pub fn new(history_capacity: usize) -> Self {
        Self::with_top_k(history_capacity, DEFAULT_TOP_K)
    }

    /// Create an aggregator with an explicit top-K size
    pub fn with_top_k(history_capacity: usize, top_k: usize) -> Self {
        Self {
            total_events: AtomicU64::new(0),
            gc_count: AtomicU64::new(0),
            lock_count: AtomicU64::new(0),
            exception_count: AtomicU64::new(0),
            heap_used_bytes: AtomicU64::new(0),
            heap_committed_bytes: AtomicU64::new(0),
            last_gc_pause_bits: AtomicU64::new(0f64.to_bits()),
            history: HistoryBuffer::with_capacity(history_capacity),
            tables: Mutex::new(Tables::default()),
            top_k,
        }
    }

    /// Fold one event into the aggregate
    pub fn accept(&self, event: &Event) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        match event.category() {
            EventCategory::HeapSummary => self.record_heap(event),
            EventCategory::Gc => {
                self.gc_count.fetch_add(1, Ordering::Relaxed);
                if let Some(pause) = event.duration_ms() {
                    self.last_gc_pause_bits
                        .store(pause.to_bits(), Ordering::Relaxed);
                }
            }
            EventCategory::Lock => {
                self.lock_count.fetch_add(1, Ordering::Relaxed);
            }
            EventCategory::Exception => {
                self.exception_count.fetch_add(1, Ordering::Relaxed);
            }
            EventCategory::Other => {}
        }

        {
            let mut tables = self.tables.lock();
            *tables.event_counts.entry(event.kind().to_string()).or_insert(0) += 1;

            match event.category() {
                EventCategory::Lock => {
                    if let (Some(thread), Some(duration)) = (event.thread(), event.duration_ms()) {
                        tables.blocked_threads.add(thread, duration);
                    }
                }
                EventCategory::Exception => {
                    if let Some(class) = event.exception_class() {
                        tables.exceptions.add(class, 1);
                    }
                }
                _ => {}
            }

            tables.last_event = Some(event.clone());
        }

        self.history.push(event.clone());
    }

    fn record_heap(&self, event: &Event) {
        let used = event
            .field("heapUsed")
            .and_then(|v| v.get("used"))
            .and_then(|v| v.as_u64());
        if let Some(used) = used {
            self.heap_used_bytes.store(used, Ordering::Relaxed);
        }

        let committed = event
            .field("heapCommitted")
            .and_then(|v| v.get("committed"))
            .and_then(|v| v.as_u64());
        if let Some(committed) = committed {
            self.heap_committed_bytes.store(committed, Ordering::Relaxed);
        }
    }

    /// Current counter block
    pub fn counters(&self) -> Counters {
        Counters {
            total_events: self.total_events(),
            gc_count: self.gc_count(),
            lock_count: self.lock_count(),
            exception_count: self.exception_count(),
            heap_used_bytes: self.heap_used_bytes(),
            heap_committed_bytes: self.heap_committed_bytes(),
            last_gc_pause_ms: self.last_gc_pause_ms(),
            ..Counters::default()
        }
        .with_derived()
    }

    /// Assemble an immutable copy of the aggregate
    pub fn snapshot(&self) -> StatsSnapshot {
        let metrics = self.counters();

        let (event_counts, top_exceptions, top_blocked_threads, last_event) = {
            let tables = self.tables.lock();
            (
                tables.event_counts.clone(),
                tables
                    .exceptions
                    .top(self.top_k)
                    .into_iter()
                    .map(TopEntry::from)
                    .collect(),
                tables
                    .blocked_threads
                    .top(self.top_k)
                    .into_iter()
                    .map(TopEntry::from)
                    .collect(),
                tables.last_event.clone(),
            )
        };

        StatsSnapshot {
            timestamp: Utc::now(),
            metrics,
            event_counts,
            top_exceptions,
            top_blocked_threads,
            last_event,
            history: self.history.to_vec(),
        }
    }

    /// Copy of the history, oldest first
    pub fn history(&self) -> Vec<Event> {
        self.history.to_vec()
    }

    /// Reset every counter, table and the history
    pub fn clear(&self) {
        for counter in [
            &self.total_events,
            &self.gc_count,
            &self.lock_count,
            &self.exception_count,
            &self.heap_used_bytes,
            &self.heap_committed_bytes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.last_gc_pause_bits
            .store(0f64.to_bits(), Ordering::Relaxed);

        *self.tables.lock() = Tables::default();
        self.history.clear();
    }

    /// History capacity
    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Rows reported per top-K table
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn gc_count(&self) -> u64 {
        self.gc_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lock_count(&self) -> u64 {
        self.lock_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn exception_count(&self) -> u64 {
        self.exception_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn heap_used_bytes(&self) -> u64 {
        self.heap_used_bytes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn heap_committed_bytes(&self) -> u64 {
        self.heap_committed_bytes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn last_gc_pause_ms(&self) -> f64 {
        f64::from_bits(self.last_gc_pause_bits.load(Ordering::Relaxed))
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
