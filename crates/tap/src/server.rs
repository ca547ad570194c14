//! TCP server for hub connections
//!
//! `TapServer` listens on a TCP socket. Each connection must authenticate
//! before it receives events.
//!
//! # Protocol
//!
//! All messages are UTF-8 lines terminated by `\n`.
//!
//! Client → Server:
//! - `AUTH <token>` - first and only meaningful line; anything sent after a
//!   successful handshake is read and discarded
//!
//! Server → Client:
//! - `OK Welcome` - handshake accepted
//! - `ERR <reason>` - handshake rejected, connection closes
//! - `{...}` - one JSON event per line, in publish order

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use jtail_auth::TokenGate;
use jtail_protocol::line::{
    REASON_AUTH_REQUIRED, REASON_AUTH_TIMEOUT, REASON_HUB_FULL, REASON_INVALID_TOKEN,
};
use jtail_protocol::{HandshakeReply, MAX_LINE_LENGTH, parse_auth_line};

use crate::error::{Result, TapError};
use crate::tap_point::TapPoint;

/// Default TCP port
pub const DEFAULT_TCP_PORT: u16 = 7099;

/// Default window for the `AUTH` line
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Scratch size for draining post-handshake client input
const DRAIN_BUFFER_SIZE: usize = 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct TapServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// How long a new connection has to send `AUTH <token>`
    pub auth_timeout: Duration,
    /// Reject connections that do not authenticate
    ///
    /// When false every connection is welcomed immediately and any `AUTH`
    /// line it sends is ignored.
    pub require_auth: bool,
}

impl Default for TapServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_TCP_PORT)),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            require_auth: true,
        }
    }
}

impl TapServerConfig {
    /// Create config with a custom listen address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Create config with a custom handshake window
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Create config with authentication switched on or off
    pub fn with_require_auth(mut self, require_auth: bool) -> Self {
        self.require_auth = require_auth;
        self
    }
}

/// Shared state handed to each connection task
struct ConnectionContext {
    tap_point: Arc<TapPoint>,
    gate: TokenGate,
    config: TapServerConfig,
}

/// TCP server for hub connections
pub struct TapServer {
    /// Bound listener
    listener: TcpListener,
    /// Per-connection context
    context: Arc<ConnectionContext>,
}

impl TapServer {
    /// Bind the listen socket
    ///
    /// Binding is separate from `run` so callers can learn the actual port
    /// when binding to port 0.
    pub async fn bind(
        tap_point: Arc<TapPoint>,
        gate: TokenGate,
        config: TapServerConfig,
    ) -> Result<Self> {
        if config.auth_timeout.is_zero() {
            return Err(TapError::InvalidConfig(
                "auth_timeout must be greater than zero".into(),
            ));
        }

        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|source| TapError::Bind {
                addr: config.addr,
                source,
            })?;

        Ok(Self {
            listener,
            context: Arc::new(ConnectionContext {
                tap_point,
                gate,
                config,
            }),
        })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until `cancel` fires
    ///
    /// Cancellation stops accepting, signals every connection task and
    /// releases the listener.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, require_auth = self.context.config.require_auth, "tap server listening");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(%addr, "tap server shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let context = Arc::clone(&self.context);
                            let cancel = cancel.child_token();

                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, context, cancel).await {
                                    debug!(error = %e, %peer, "hub connection ended");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Start the server in a background task
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

/// Removes the peer from the hub when the connection task ends
struct SubscriptionGuard {
    tap_point: Arc<TapPoint>,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        // Already gone if the hub dropped it for lagging
        let _ = self.tap_point.unsubscribe(self.id);
    }
}

/// Outcome of the handshake window
enum Handshake {
    Accepted,
    Rejected(&'static str),
    /// Peer closed before sending anything
    Closed,
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    context: Arc<ConnectionContext>,
    cancel: CancellationToken,
) -> Result<()> {
    debug!(%peer, "new hub client connected");

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let handshake = if context.config.require_auth {
        authenticate(&mut reader, peer, &context).await?
    } else {
        Handshake::Accepted
    };

    match handshake {
        Handshake::Accepted => {}
        Handshake::Rejected(reason) => {
            warn!(%peer, reason, "hub handshake rejected");
            reject(&mut write_half, reason).await;
            return Ok(());
        }
        Handshake::Closed => {
            debug!(%peer, "hub client left before authenticating");
            return Ok(());
        }
    }

    let (id, mut receiver) = match context.tap_point.subscribe(peer) {
        Ok(registration) => registration,
        Err(e) => {
            warn!(%peer, error = %e, "hub full, refusing peer");
            reject(&mut write_half, REASON_HUB_FULL).await;
            return Err(e);
        }
    };
    let _guard = SubscriptionGuard {
        tap_point: Arc::clone(&context.tap_point),
        id,
    };

    write_half
        .write_all(HandshakeReply::welcome().encode().as_bytes())
        .await?;

    info!(id, %peer, "hub client subscribed");

    let mut scratch = [0u8; DRAIN_BUFFER_SIZE];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            // Line from the hub
            line = receiver.recv() => {
                match line {
                    Some(line) => {
                        if let Err(e) = write_half.write_all(line.as_bytes()).await {
                            debug!(error = %e, id, "failed to send event to client");
                            break;
                        }
                    }
                    None => {
                        // Dropped by the hub (lagging) or hub closing
                        debug!(id, "hub closed peer queue");
                        break;
                    }
                }
            }

            // Client input, read only to detect EOF
            read = reader.read(&mut scratch) => {
                match read {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, id, "hub client read failed");
                        break;
                    }
                }
            }
        }
    }

    let _ = write_half.shutdown().await;
    info!(id, %peer, "hub client disconnected");

    Ok(())
}

/// Wait for the `AUTH <token>` line and verify it
async fn authenticate(
    reader: &mut BufReader<OwnedReadHalf>,
    peer: SocketAddr,
    context: &ConnectionContext,
) -> Result<Handshake> {
    let mut raw = Vec::new();
    let mut limited = (&mut *reader).take(MAX_LINE_LENGTH as u64);

    let read = tokio::time::timeout(
        context.config.auth_timeout,
        limited.read_until(b'\n', &mut raw),
    )
    .await;

    let handshake = match read {
        Err(_) => Handshake::Rejected(REASON_AUTH_TIMEOUT),
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(0)) => Handshake::Closed,
        // Bytes that are not UTF-8 cannot be an AUTH line
        Ok(Ok(_)) => match std::str::from_utf8(&raw).map(parse_auth_line) {
            Ok(Ok(token)) => match context.gate.claims(token) {
                Ok(_) => Handshake::Accepted,
                Err(e) => {
                    // The peer only ever sees the generic reason
                    debug!(%peer, error = %e, "hub token rejected");
                    Handshake::Rejected(REASON_INVALID_TOKEN)
                }
            },
            Ok(Err(_)) | Err(_) => Handshake::Rejected(REASON_AUTH_REQUIRED),
        },
    };

    Ok(handshake)
}

/// Send an `ERR` line and close the write side
async fn reject(write_half: &mut OwnedWriteHalf, reason: &str) {
    let reply = HandshakeReply::reject(reason).encode();
    let _ = write_half.write_all(reply.as_bytes()).await;
    let _ = write_half.shutdown().await;
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
