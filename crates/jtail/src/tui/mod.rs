//! Live terminal viewer for a hub's event stream.
//!
//! Streams events newest-first with local counters, an events/sec
//! sparkline, threshold alerts and an optional metrics panel fed by the
//! monitor's HTTP surface.

mod action;
mod app;
mod connection;
mod event;
mod poller;
mod state;
mod theme;
mod ui;

pub use app::{App, AppOptions};
pub use poller::POLL_TIMEOUT;
