//! Application state
//!
//! Handles to the live aggregate, the hub and the token gate. Cloned per
//! request; every field is cheap to clone.

use std::sync::Arc;
use std::time::Instant;

use jtail_auth::TokenGate;
use jtail_stats::StatsAggregator;
use jtail_tap::TapPoint;

use crate::auth::HasTokenGate;

/// Which optional route groups are served
#[derive(Debug, Clone, Copy)]
pub struct RouteOptions {
    /// Stats, history, metrics and bundle
    pub stats_enabled: bool,
    /// HTML dashboard
    pub dashboard_enabled: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            stats_enabled: true,
            dashboard_enabled: true,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Live aggregate
    pub stats: Arc<StatsAggregator>,
    /// Broadcast hub, for subscriber counts
    pub tap_point: Arc<TapPoint>,
    /// Token verification
    pub gate: TokenGate,
    /// Enabled route groups
    pub routes: RouteOptions,
    /// Process start, for uptime
    pub start_time: Instant,
}

impl AppState {
    /// Create state with every route enabled
    pub fn new(stats: Arc<StatsAggregator>, tap_point: Arc<TapPoint>, gate: TokenGate) -> Self {
        Self {
            stats,
            tap_point,
            gate,
            routes: RouteOptions::default(),
            start_time: Instant::now(),
        }
    }

    /// Set the enabled route groups
    pub fn with_routes(mut self, routes: RouteOptions) -> Self {
        self.routes = routes;
        self
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl HasTokenGate for AppState {
    fn token_gate(&self) -> &TokenGate {
        &self.gate
    }
}
