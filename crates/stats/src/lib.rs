//! jtail Stats - Event aggregation and alerting
//!
//! - `StatsAggregator` - Running counters, bounded history and top-K tables,
//!   fed one event at a time from any number of producer threads
//! - `StatsSnapshot` - Immutable point-in-time copy of the aggregate
//! - `AlertEvaluator` - Stateless threshold rules delivering alerts to listeners
//!
//! # Locking
//!
//! Scalar counters are independent atomics, so ingestion never serializes on
//! them. The history ring and the top-K tables each sit behind their own
//! mutex; a snapshot copies both out and never aliases internal state.

pub mod aggregator;
pub mod alerts;
mod history;
pub mod snapshot;
mod top;

pub use aggregator::{DEFAULT_HISTORY_CAPACITY, DEFAULT_TOP_K, StatsAggregator};
pub use alerts::{Alert, AlertEvaluator, AlertKind, AlertListener, AlertThresholds};
pub use history::{HistoryBuffer, MAX_HISTORY_CAPACITY};
pub use snapshot::{Counters, StatsSnapshot, TopEntry};
pub use top::TopTable;
