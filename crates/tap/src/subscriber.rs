//! Subscriber management for hub peers
//!
//! Each authenticated connection gets a `Subscriber` holding:
//! - Unique ID for the connection
//! - Remote address, for logging
//! - Bounded channel sender for pre-encoded lines
//!
//! The `SubscriberManager` handles registration, removal, and fan-out.
//! Fan-out never waits: a full or closed queue removes the peer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TapError};

/// Counter for generating unique subscriber IDs
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Default maximum number of concurrent subscribers
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 100;

/// Default per-peer outbound queue size, in lines
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// A single hub peer
#[derive(Debug)]
pub struct Subscriber {
    /// Unique identifier
    id: u64,
    /// Remote address
    peer: SocketAddr,
    /// Channel sender for line delivery
    sender: mpsc::Sender<Arc<str>>,
}

impl Subscriber {
    /// Create a new subscriber
    pub fn new(peer: SocketAddr, sender: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id: SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            peer,
            sender,
        }
    }

    /// Get the subscriber ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the remote address
    #[inline]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Try to queue a line for this subscriber
    ///
    /// Returns false if the queue is full or the receiver is gone.
    #[inline]
    pub fn try_send(&self, line: Arc<str>) -> bool {
        self.sender.try_send(line).is_ok()
    }

    /// Check if this subscriber is still connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Result of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Peers that accepted the line
    pub delivered: usize,
    /// Peers removed because their queue was full or closed
    pub dropped: usize,
}

/// Manages all active subscribers
#[derive(Debug)]
pub struct SubscriberManager {
    /// Active subscribers
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    /// Registration limit
    max_subscribers: usize,
    /// Per-subscriber channel capacity
    queue_size: usize,
}

impl Default for SubscriberManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberManager {
    /// Create a new subscriber manager with default limits
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SUBSCRIBERS, DEFAULT_QUEUE_SIZE)
    }

    /// Create a manager with explicit limits
    ///
    /// A zero queue size is raised to one.
    pub fn with_limits(max_subscribers: usize, queue_size: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            max_subscribers,
            queue_size: queue_size.max(1),
        }
    }

    /// Register a new subscriber
    ///
    /// Returns the subscriber ID and receiver channel
    pub fn subscribe(&self, peer: SocketAddr) -> Result<(u64, mpsc::Receiver<Arc<str>>)> {
        let mut subscribers = self.subscribers.write();

        if subscribers.len() >= self.max_subscribers {
            return Err(TapError::MaxSubscribers {
                max: self.max_subscribers,
            });
        }

        let (sender, receiver) = mpsc::channel(self.queue_size);
        let subscriber = Arc::new(Subscriber::new(peer, sender));

        let id = subscriber.id();
        subscribers.push(subscriber);

        Ok((id, receiver))
    }

    /// Unsubscribe by ID
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.id() != id);

        if subscribers.len() == original_len {
            return Err(TapError::SubscriberNotFound { id });
        }

        Ok(())
    }

    /// Get number of active subscribers
    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if there are any subscribers
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.read().is_empty()
    }

    /// Queue a line on every subscriber
    ///
    /// Subscribers whose queue rejects the line are removed before returning.
    pub fn broadcast(&self, line: Arc<str>) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut rejected = Vec::new();

        {
            let subscribers = self.subscribers.read();
            for subscriber in subscribers.iter() {
                if subscriber.try_send(Arc::clone(&line)) {
                    outcome.delivered += 1;
                } else {
                    rejected.push(subscriber.id());
                }
            }
        }

        if !rejected.is_empty() {
            let mut subscribers = self.subscribers.write();
            subscribers.retain(|s| {
                let drop = rejected.contains(&s.id());
                if drop {
                    debug!(id = s.id(), peer = %s.peer(), "dropping lagging or closed peer");
                }
                !drop
            });
            outcome.dropped = rejected.len();
        }

        outcome
    }

    /// Clean up disconnected subscribers
    pub fn cleanup_disconnected(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.is_connected());
        original_len - subscribers.len()
    }

    /// Remove every subscriber, closing their queues
    pub fn clear(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let removed = subscribers.len();
        subscribers.clear();
        removed
    }
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
