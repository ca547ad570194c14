//! jtail Tap - Live event broadcast over TCP
//!
//! Long-lived line-protocol connections authenticate once with a signed
//! token and then receive every ingested event as one JSON document per line.
//!
//! - Serialization happens once per event, not once per peer
//! - Each peer has a bounded outbound queue; a peer that falls behind or
//!   disconnects is dropped without ever blocking the producer
//! - Each connection is serviced by its own task, so a silent peer never
//!   holds up the accept loop or other peers
//!
//! # Architecture
//!
//! ```text
//! Monitor::ingest()
//!     │
//!     ▼
//! TapPoint::publish() ── encode once ──┐
//!                                      ▼
//!                     Subscribers (bounded per-peer queues)
//!                                      │
//!                                      ▼
//!                     TapServer connection tasks (TCP)
//!                                      │
//!                                      ▼
//!                              `jtail connect`, nc, ...
//! ```

mod error;
pub mod server;
pub mod subscriber;
pub mod tap_point;

pub use error::{Result, TapError};
pub use server::{DEFAULT_AUTH_TIMEOUT, DEFAULT_TCP_PORT, TapServer, TapServerConfig};
pub use subscriber::{
    BroadcastOutcome, DEFAULT_MAX_SUBSCRIBERS, DEFAULT_QUEUE_SIZE, Subscriber, SubscriberManager,
};
pub use tap_point::{TapPoint, TapStats};
