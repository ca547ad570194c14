//! Companion metrics poller.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::action::Action;
use crate::client::MonitorClient;

/// Interval between `/jfr/stats` polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Per-request timeout
pub const POLL_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `client` every `interval` until cancelled
pub async fn run(
    client: MonitorClient,
    interval: Duration,
    tx: UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = client.snapshot() => result.map_err(|e| format!("{:#}", e)),
        };

        if tx.send(Action::Metrics(result)).is_err() {
            break;
        }
    }
}
