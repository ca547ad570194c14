//! Messages from background tasks to the TUI.

use jtail_stats::StatsSnapshot;

/// Updates produced by the connection and poller tasks.
///
/// Applied to `TuiState`; none of them triggers a redraw on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Handshake accepted by the hub at this address
    Connected(String),
    /// Connection lost or could not be opened
    Disconnected(String),
    /// Hub answered the handshake with `ERR`; carries the full reply
    AuthFailed(String),
    /// Raw line received after the handshake
    Line(String),
    /// Result of one metrics poll
    Metrics(Result<StatsSnapshot, String>),
    /// Appending to the record file failed; recording stops
    RecordFailed(String),
}
