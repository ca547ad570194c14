//! Monitor service
//!
//! Owns the aggregator, the alert evaluator and the hub's tap point. Every
//! ingested event flows through all three in order:
//!
//! ```text
//! feed ──▶ Monitor::ingest ──▶ StatsAggregator::accept
//!                          ──▶ AlertEvaluator::evaluate
//!                          ──▶ TapPoint::publish ──▶ hub peers
//! ```

use std::sync::Arc;

use jtail_auth::TokenGate;
use jtail_config::Config;
use jtail_protocol::Event;
use jtail_stats::{AlertEvaluator, AlertThresholds, StatsAggregator};
use jtail_tap::TapPoint;

/// Producer-facing entry point
pub trait EventSink: Send + Sync {
    /// Accept one event; never blocks on consumers
    fn ingest(&self, event: Event);
}

/// The running monitor: one per `serve` process
pub struct Monitor {
    stats: Arc<StatsAggregator>,
    alerts: Arc<AlertEvaluator>,
    tap_point: Arc<TapPoint>,
    gate: TokenGate,
}

impl Monitor {
    /// Build a monitor from configuration
    pub fn from_config(config: &Config, gate: TokenGate) -> Self {
        let stats = StatsAggregator::with_top_k(config.stats.history_capacity, config.stats.top_k);
        let alerts = AlertEvaluator::new(AlertThresholds {
            gc_pause_ms: config.alerts.gc_pause_ms,
            lock_contention_ms: config.alerts.lock_contention_ms,
        });
        let tap_point =
            TapPoint::with_limits(config.server.max_peers, config.server.peer_queue_size);

        Self::new(stats, alerts, tap_point, gate)
    }

    /// Build a monitor from its parts
    pub fn new(
        stats: StatsAggregator,
        alerts: AlertEvaluator,
        tap_point: TapPoint,
        gate: TokenGate,
    ) -> Self {
        Self {
            stats: Arc::new(stats),
            alerts: Arc::new(alerts),
            tap_point: Arc::new(tap_point),
            gate,
        }
    }

    /// The live aggregate
    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    /// The alert evaluator, for registering listeners
    pub fn alerts(&self) -> &Arc<AlertEvaluator> {
        &self.alerts
    }

    /// The hub's fan-out point
    pub fn tap_point(&self) -> &Arc<TapPoint> {
        &self.tap_point
    }

    /// Token verification shared by the hub and the HTTP surface
    pub fn gate(&self) -> &TokenGate {
        &self.gate
    }
}

impl EventSink for Monitor {
    fn ingest(&self, event: Event) {
        self.stats.accept(&event);
        self.alerts.evaluate(&event);
        self.tap_point.publish(&event);
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;
