//! TapPoint - the broadcast point for live events
//!
//! `TapPoint` sits between ingestion and the hub connections:
//!
//! - Zero work beyond a counter bump when nobody is connected
//! - Each event is encoded to a JSON line once and shared by all peers
//! - Peers that cannot keep up are dropped, never waited on
//! - Periodic cleanup of peers whose connection task has gone away
//!
//! # Usage
//!
//! ```ignore
//! let tap_point = TapPoint::new();
//!
//! // In the ingest path:
//! tap_point.publish(&event);  // never blocks, never fails
//!
//! // For new connections:
//! let (id, rx) = tap_point.subscribe(peer_addr)?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use jtail_protocol::{Event, encode_event_line};

use crate::error::Result;
use crate::subscriber::SubscriberManager;

/// Interval for cleanup of disconnected subscribers
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// The broadcast point for live streaming
#[derive(Debug)]
pub struct TapPoint {
    /// Subscriber manager
    subscribers: SubscriberManager,
    /// Total events published
    published: AtomicU64,
    /// Total lines queued to peers
    delivered: AtomicU64,
    /// Peers removed for lagging or closing
    dropped_peers: AtomicU64,
}

impl TapPoint {
    /// Create a new tap point with default limits
    pub fn new() -> Self {
        Self::from_manager(SubscriberManager::new())
    }

    /// Create a tap point with explicit peer limit and queue size
    pub fn with_limits(max_subscribers: usize, queue_size: usize) -> Self {
        Self::from_manager(SubscriberManager::with_limits(max_subscribers, queue_size))
    }

    fn from_manager(subscribers: SubscriberManager) -> Self {
        Self {
            subscribers,
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped_peers: AtomicU64::new(0),
        }
    }

    /// Send an event to every registered peer
    ///
    /// Returns the number of peers the line was queued for. Encoding
    /// failures are logged and reported as zero deliveries.
    pub fn publish(&self, event: &Event) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        // Fast path: no subscribers = no encoding
        if !self.subscribers.has_subscribers() {
            return 0;
        }

        let line: Arc<str> = match encode_event_line(event) {
            Ok(line) => Arc::from(line),
            Err(e) => {
                warn!(error = %e, kind = event.kind(), "failed to encode event for broadcast");
                return 0;
            }
        };

        let outcome = self.subscribers.broadcast(line);
        if outcome.delivered > 0 {
            self.delivered
                .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
            trace!(sent = outcome.delivered, "published event to peers");
        }
        if outcome.dropped > 0 {
            self.dropped_peers
                .fetch_add(outcome.dropped as u64, Ordering::Relaxed);
        }

        outcome.delivered
    }

    /// Register a peer
    ///
    /// Returns the subscriber ID and the receiver for its encoded lines.
    pub fn subscribe(&self, peer: SocketAddr) -> Result<(u64, mpsc::Receiver<Arc<str>>)> {
        let (id, receiver) = self.subscribers.subscribe(peer)?;
        debug!(id, %peer, "new hub peer");
        Ok((id, receiver))
    }

    /// Deregister a peer
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        self.subscribers.unsubscribe(id)?;
        debug!(id, "hub peer removed");
        Ok(())
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    /// Check if there are any subscribers
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        self.subscribers.has_subscribers()
    }

    /// Get hub statistics
    pub fn stats(&self) -> TapStats {
        TapStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_peers: self.dropped_peers.load(Ordering::Relaxed),
            subscriber_count: self.subscribers.count(),
        }
    }

    /// Clean up disconnected subscribers
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup(&self) -> usize {
        let removed = self.subscribers.cleanup_disconnected();

        if removed > 0 {
            debug!(removed, "cleaned up disconnected peers");
        }

        removed
    }

    /// Drop every peer; their connection tasks see a closed queue and exit
    pub fn close_all(&self) -> usize {
        self.subscribers.clear()
    }

    /// Spawn the maintenance task
    ///
    /// Cleans up disconnected peers every 5 seconds until `cancel` fires.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let tap_point = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        tap_point.cleanup();
                    }
                }
            }
        })
    }
}

impl Default for TapPoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapStats {
    /// Total events passed to `publish`
    pub published: u64,
    /// Total lines queued to peers
    pub delivered: u64,
    /// Peers dropped for lagging or closing
    pub dropped_peers: u64,
    /// Current number of subscribers
    pub subscriber_count: usize,
}

#[cfg(test)]
#[path = "tap_point_test.rs"]
mod tests;
