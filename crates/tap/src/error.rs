//! Hub errors

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised by the broadcast hub
#[derive(Error, Debug)]
pub enum TapError {
    /// Listen socket could not be opened
    #[error("failed to bind hub to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Socket failure on an established peer
    #[error("hub socket error: {0}")]
    Io(#[from] io::Error),

    #[error("hub is full ({max} peers)")]
    MaxSubscribers { max: usize },

    #[error("no peer with id {id}")]
    SubscriberNotFound { id: u64 },

    #[error("invalid hub configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TapError>;
