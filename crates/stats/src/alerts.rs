//! Threshold alerting
//!
//! Rules are pure functions of a single event. Delivery goes to every
//! registered listener; a panicking listener is isolated from the others.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use jtail_protocol::{Event, EventCategory};

/// Default GC pause threshold in milliseconds
pub const DEFAULT_GC_PAUSE_MS: f64 = 500.0;

/// Default lock contention threshold in milliseconds
pub const DEFAULT_LOCK_CONTENTION_MS: f64 = 1000.0;

/// Alert thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// GC pauses strictly above this raise an alert
    pub gc_pause_ms: f64,
    /// Lock or park waits strictly above this raise an alert
    pub lock_contention_ms: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            gc_pause_ms: DEFAULT_GC_PAUSE_MS,
            lock_contention_ms: DEFAULT_LOCK_CONTENTION_MS,
        }
    }
}

/// Which rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    GcPause,
    Exception,
    LockContention,
}

/// A fired alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    /// Human-readable text, e.g. `ALERT: GC Pause too high! 750.0ms`
    pub message: String,
    /// Timestamp of the triggering event
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives alerts as they fire
pub trait AlertListener: Send + Sync {
    fn on_alert(&self, alert: &Alert);
}

impl<F> AlertListener for F
where
    F: Fn(&Alert) + Send + Sync,
{
    fn on_alert(&self, alert: &Alert) {
        self(alert)
    }
}

/// Applies threshold rules and fans alerts out to listeners
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    listeners: RwLock<Vec<Arc<dyn AlertListener>>>,
}

impl fmt::Debug for AlertEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertEvaluator")
            .field("thresholds", &self.thresholds)
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

impl AlertEvaluator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    /// Register a listener
    pub fn add_listener(&self, listener: impl AlertListener + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Alerts `event` would raise, without delivering them
    pub fn check(&self, event: &Event) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let timestamp = event.timestamp();

        match event.category() {
            EventCategory::Gc => {
                if let Some(pause) = event.duration_ms()
                    && pause > self.thresholds.gc_pause_ms
                {
                    alerts.push(Alert {
                        kind: AlertKind::GcPause,
                        message: format!("ALERT: GC Pause too high! {pause:.1}ms"),
                        timestamp,
                    });
                }
            }
            EventCategory::Exception => {
                let class = event.exception_class().unwrap_or("unknown");
                alerts.push(Alert {
                    kind: AlertKind::Exception,
                    message: format!("ALERT: Exception detected: {class}"),
                    timestamp,
                });
            }
            EventCategory::Lock => {
                if let Some(wait) = event.duration_ms()
                    && wait > self.thresholds.lock_contention_ms
                {
                    alerts.push(Alert {
                        kind: AlertKind::LockContention,
                        message: format!(
                            "ALERT: High lock contention / park: {wait:.1}ms on thread {}",
                            event.thread_name()
                        ),
                        timestamp,
                    });
                }
            }
            EventCategory::HeapSummary | EventCategory::Other => {}
        }

        alerts
    }

    /// Check `event` and deliver every resulting alert
    ///
    /// Returns the alerts that fired.
    pub fn evaluate(&self, event: &Event) -> Vec<Alert> {
        let alerts = self.check(event);
        if alerts.is_empty() {
            return alerts;
        }

        let listeners: Vec<Arc<dyn AlertListener>> = self.listeners.read().clone();
        for alert in &alerts {
            warn!(kind = ?alert.kind, "{}", alert.message);
            for listener in &listeners {
                let delivered = catch_unwind(AssertUnwindSafe(|| listener.on_alert(alert)));
                if delivered.is_err() {
                    warn!(kind = ?alert.kind, "alert listener panicked");
                }
            }
        }

        alerts
    }
}

#[cfg(test)]
#[path = "alerts_test.rs"]
mod tests;
