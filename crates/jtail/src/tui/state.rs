//! TUI state and its update functions.
//!
//! Everything the screen shows lives in `TuiState`. Network actions, key
//! presses and ticks mutate it; `ui::render` only reads it. Time is passed in
//! so banner expiry and the rate window can be tested without sleeping.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use jtail_protocol::{Event, EventCategory, decode_event_line};
use jtail_stats::{AlertEvaluator, AlertThresholds, StatsSnapshot};
use serde::Serialize;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use super::action::Action;

/// Events kept in the list
pub const MAX_EVENTS: usize = 500;

/// Seconds covered by the events/sec chart
pub const RATE_WINDOW_SECS: usize = 20;

/// How long an alert banner or a notice stays up
pub const BANNER_DURATION: Duration = Duration::from_secs(5);

const PAGE_SIZE: usize = 10;

/// Longest raw line quoted in a parse error
const MAX_QUOTED_LINE: usize = 200;

pub const CONNECTED: &str = "CONNECTED";
pub const DISCONNECTED: &str = "DISCONNECTED";
pub const AUTH_FAILED: &str = "AUTH FAILED";
pub const PARSE_ERROR: &str = "PARSE ERROR";

/// Input mode
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    /// Editing the filter
    Filtering,
    /// Modal showing one event
    Detail(Box<Event>),
}

/// What the app loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
    SaveBundle,
}

/// Hub connection as last reported by the connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected(String),
    Disconnected(String),
    AuthFailed(String),
}

/// Companion metrics source state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsStatus {
    /// No `--metrics-url`
    Disabled,
    /// Waiting for the first poll
    Waiting,
    Ok,
    Err(String),
}

/// One row of the event list
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub event: Event,
    /// Generated by this client (connection changes, parse errors)
    pub local: bool,
}

impl Entry {
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.event.kind().to_lowercase().contains(needle)
            || self.event.thread_name().to_lowercase().contains(needle)
    }
}

/// Counters re-derived from received events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalStats {
    pub total: u64,
    pub gc: u64,
    pub lock: u64,
    pub exception: u64,
    pub by_kind: BTreeMap<String, u64>,
}

impl LocalStats {
    fn accept(&mut self, event: &Event) {
        self.total += 1;
        match event.category() {
            EventCategory::Gc => self.gc += 1,
            EventCategory::Lock => self.lock += 1,
            EventCategory::Exception => self.exception += 1,
            EventCategory::HeapSummary | EventCategory::Other => {}
        }
        *self.by_kind.entry(event.kind().to_string()).or_insert(0) += 1;
    }
}

/// Per-second arrival counts over the last `RATE_WINDOW_SECS` seconds
#[derive(Debug, Clone)]
pub struct RateWindow {
    origin: Instant,
    /// (second since origin, count), ascending
    buckets: VecDeque<(u64, u64)>,
}

impl RateWindow {
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            buckets: VecDeque::with_capacity(RATE_WINDOW_SECS + 1),
        }
    }

    fn second(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_secs()
    }

    pub fn record(&mut self, now: Instant) {
        let second = self.second(now);
        match self.buckets.back_mut() {
            Some((last, count)) if *last == second => *count += 1,
            _ => self.buckets.push_back((second, 1)),
        }

        while let Some(&(oldest, _)) = self.buckets.front() {
            if oldest + RATE_WINDOW_SECS as u64 <= second {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }

    /// Counts for each of the last `RATE_WINDOW_SECS` seconds, oldest first
    pub fn series(&self, now: Instant) -> Vec<u64> {
        let current = self.second(now) as i64;
        (0..RATE_WINDOW_SECS as i64)
            .map(|i| current - (RATE_WINDOW_SECS as i64 - 1 - i))
            .map(|second| {
                self.buckets
                    .iter()
                    .find(|(s, _)| *s as i64 == second)
                    .map_or(0, |(_, count)| *count)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// Time-boxed message
#[derive(Debug, Clone, PartialEq, Eq)]
struct Timed {
    message: String,
    raised_at: Instant,
}

/// Local incident export written by the `b` key
#[derive(Debug, Clone, Serialize)]
pub struct IncidentBundle {
    pub generated_at: DateTime<Utc>,
    /// Hub address this client follows
    pub target: String,
    pub connection: String,
    pub stats: LocalStats,
    /// Events per second, oldest first
    pub events_per_sec: Vec<u64>,
    /// Newest first
    pub events: Vec<Event>,
    /// Last good companion snapshot
    pub metrics: Option<StatsSnapshot>,
}

impl IncidentBundle {
    /// File name stamped with the generation time
    pub fn file_name(&self) -> String {
        format!("jfr-incident-{}.json", self.generated_at.format("%Y%m%d-%H%M%S"))
    }
}

/// Complete TUI state
pub struct TuiState {
    target: String,
    entries: VecDeque<Entry>,
    stats: LocalStats,
    rate: RateWindow,
    alerts: AlertEvaluator,
    banner: Option<Timed>,
    notice: Option<Timed>,
    mode: Mode,
    filter_input: Input,
    filter: String,
    selected: usize,
    paused: bool,
    show_metrics: bool,
    metrics_status: MetricsStatus,
    metrics: Option<StatsSnapshot>,
    connection: ConnectionStatus,
    recording: bool,
}

impl TuiState {
    pub fn new(
        target: impl Into<String>,
        thresholds: AlertThresholds,
        recording: bool,
        metrics_enabled: bool,
        now: Instant,
    ) -> Self {
        Self {
            target: target.into(),
            entries: VecDeque::with_capacity(MAX_EVENTS),
            stats: LocalStats::default(),
            rate: RateWindow::new(now),
            alerts: AlertEvaluator::new(thresholds),
            banner: None,
            notice: None,
            mode: Mode::Normal,
            filter_input: Input::default(),
            filter: String::new(),
            selected: 0,
            paused: false,
            show_metrics: metrics_enabled,
            metrics_status: if metrics_enabled {
                MetricsStatus::Waiting
            } else {
                MetricsStatus::Disabled
            },
            metrics: None,
            connection: ConnectionStatus::Connecting,
            recording,
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Apply a message from a background task
    pub fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::Line(line) => match decode_event_line(&line) {
                Ok(event) => self.push_stream_event(event, now),
                Err(e) => {
                    let quoted: String = line.chars().take(MAX_QUOTED_LINE).collect();
                    if let Ok(event) = Event::new(PARSE_ERROR) {
                        let event = event.with_field("error", e.to_string()).with_field("line", quoted);
                        self.push_entry(Entry { event, local: true });
                    }
                }
            },
            Action::Connected(addr) => {
                if let Ok(event) = Event::new(CONNECTED) {
                    self.push_entry(Entry {
                        event: event.with_thread(addr.clone()),
                        local: true,
                    });
                }
                self.connection = ConnectionStatus::Connected(addr);
            }
            Action::Disconnected(reason) => {
                if let Ok(event) = Event::new(DISCONNECTED) {
                    self.push_entry(Entry {
                        event: event.with_field("reason", reason.clone()),
                        local: true,
                    });
                }
                self.connection = ConnectionStatus::Disconnected(reason);
            }
            Action::AuthFailed(response) => {
                if let Ok(event) = Event::new(AUTH_FAILED) {
                    self.push_entry(Entry {
                        event: event.with_thread(response.clone()),
                        local: true,
                    });
                }
                self.connection = ConnectionStatus::AuthFailed(response);
            }
            Action::Metrics(Ok(snapshot)) => {
                self.metrics = Some(snapshot);
                self.metrics_status = MetricsStatus::Ok;
            }
            Action::Metrics(Err(e)) => {
                // Keep the last good snapshot
                self.metrics_status = MetricsStatus::Err(e);
            }
            Action::RecordFailed(e) => {
                self.recording = false;
                self.notify(format!("Recording stopped: {}", e), now);
            }
        }
    }

    /// Expire the banner and the notice
    pub fn tick(&mut self, now: Instant) {
        let expired =
            |t: &Timed| now.saturating_duration_since(t.raised_at) >= BANNER_DURATION;

        if self.banner.as_ref().is_some_and(expired) {
            self.banner = None;
        }
        if self.notice.as_ref().is_some_and(expired) {
            self.notice = None;
        }
    }

    /// Show a short status message in the footer
    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.notice = Some(Timed {
            message: message.into(),
            raised_at: now,
        });
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.mode {
            Mode::Normal => return self.handle_normal_key(key, now),
            Mode::Filtering => self.handle_filter_key(key),
            Mode::Detail(_) => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = Mode::Normal;
                }
            }
        }

        KeyOutcome::Continue
    }

    fn handle_normal_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(1),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(1),
            KeyCode::PageUp => self.select_previous(PAGE_SIZE),
            KeyCode::PageDown => self.select_next(PAGE_SIZE),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible_len().saturating_sub(1),
            KeyCode::Char('/') => {
                self.filter_input = Input::new(self.filter.clone());
                self.mode = Mode::Filtering;
            }
            KeyCode::Enter => {
                if let Some(entry) = self.selected_entry() {
                    let event = entry.event.clone();
                    self.mode = Mode::Detail(Box::new(event));
                }
            }
            KeyCode::Char('c') => self.clear(now),
            KeyCode::Char('s') => self.show_metrics = !self.show_metrics,
            KeyCode::Char('b') => return KeyOutcome::SaveBundle,
            KeyCode::Char('p') => self.paused = !self.paused,
            _ => {}
        }

        KeyOutcome::Continue
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.filter = self.filter_input.value().trim().to_string();
                self.mode = Mode::Normal;
                self.selected = 0;
            }
            KeyCode::Esc => {
                self.filter_input.reset();
                self.filter.clear();
                self.mode = Mode::Normal;
                self.selected = 0;
            }
            _ => {
                self.filter_input.handle_event(&CrosstermEvent::Key(key));
            }
        }
    }

    fn push_stream_event(&mut self, event: Event, now: Instant) {
        self.stats.accept(&event);
        self.rate.record(now);

        if let Some(alert) = self.alerts.check(&event).pop() {
            self.banner = Some(Timed {
                message: alert.message,
                raised_at: now,
            });
        }

        self.push_entry(Entry { event, local: false });
    }

    /// Insert newest first and keep the list bounded
    fn push_entry(&mut self, entry: Entry) {
        let needle = self.filter.to_lowercase();

        // Paused: keep the highlighted row on the same event
        if self.paused && entry.matches(&needle) && self.visible_len() > 0 {
            self.selected += 1;
        }

        self.entries.push_front(entry);
        self.entries.truncate(MAX_EVENTS);
        self.selected = self.selected.min(self.visible_len().saturating_sub(1));
    }

    fn clear(&mut self, now: Instant) {
        self.entries.clear();
        self.stats = LocalStats::default();
        self.rate.clear();
        self.selected = 0;
        self.notify("Cleared", now);
    }

    fn select_previous(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    fn select_next(&mut self, n: usize) {
        let last = self.visible_len().saturating_sub(1);
        self.selected = (self.selected + n).min(last);
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Entries passing the filter, newest first
    pub fn visible(&self) -> Vec<&Entry> {
        let needle = self.filter.to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    fn visible_len(&self) -> usize {
        let needle = self.filter.to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).count()
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.visible().get(self.selected).copied()
    }

    /// Snapshot for the `b` key
    pub fn incident_bundle(&self, now: Instant) -> IncidentBundle {
        IncidentBundle {
            generated_at: Utc::now(),
            target: self.target.clone(),
            connection: self.connection_label(),
            stats: self.stats.clone(),
            events_per_sec: self.rate.series(now),
            events: self.entries.iter().map(|e| e.event.clone()).collect(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn connection_label(&self) -> String {
        match &self.connection {
            ConnectionStatus::Connecting => "connecting".to_string(),
            ConnectionStatus::Connected(addr) => format!("connected {}", addr),
            ConnectionStatus::Disconnected(reason) => format!("disconnected: {}", reason),
            ConnectionStatus::AuthFailed(response) => format!("auth failed: {}", response),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn event_count(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> &LocalStats {
        &self.stats
    }

    pub fn rate_series(&self, now: Instant) -> Vec<u64> {
        self.rate.series(now)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_ref().map(|t| t.message.as_str())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|t| t.message.as_str())
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn filter_input(&self) -> &Input {
        &self.filter_input
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn show_metrics(&self) -> bool {
        self.show_metrics
    }

    pub fn metrics_status(&self) -> &MetricsStatus {
        &self.metrics_status
    }

    pub fn metrics(&self) -> Option<&StatsSnapshot> {
        self.metrics.as_ref()
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
