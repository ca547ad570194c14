//! Tests for TUI state updates

use super::*;

use jtail_protocol::encode_event_line;

fn state(now: Instant) -> TuiState {
    TuiState::new("localhost:7099", AlertThresholds::default(), false, false, now)
}

fn line(event: &Event) -> Action {
    Action::Line(encode_event_line(event).unwrap().trim_end().to_string())
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn gc(ms: f64) -> Event {
    Event::new("jdk.GarbageCollection").unwrap().with_duration_ms(ms)
}

fn park(thread: &str) -> Event {
    Event::new("jdk.ThreadPark")
        .unwrap()
        .with_thread(thread)
        .with_duration_ms(5.0)
}

fn kinds(state: &TuiState) -> Vec<String> {
    state
        .visible()
        .iter()
        .map(|e| e.event.kind().to_string())
        .collect()
}

// =============================================================================
// Stream
// =============================================================================

#[test]
fn test_events_newest_first_with_local_stats() {
    let now = Instant::now();
    let mut state = state(now);

    state.apply(line(&gc(10.0)), now);
    state.apply(line(&park("worker-1")), now);
    state.apply(
        line(
            &Event::new("jdk.ExceptionThrown")
                .unwrap()
                .with_field("thrownClass", "java.io.IOException"),
        ),
        now,
    );

    assert_eq!(
        kinds(&state),
        vec!["jdk.ExceptionThrown", "jdk.ThreadPark", "jdk.GarbageCollection"]
    );

    let stats = state.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.gc, 1);
    assert_eq!(stats.lock, 1);
    assert_eq!(stats.exception, 1);
    assert_eq!(stats.by_kind["jdk.ThreadPark"], 1);
}

#[test]
fn test_list_capped() {
    let now = Instant::now();
    let mut state = state(now);

    for i in 0..(MAX_EVENTS + 25) {
        state.apply(line(&gc(i as f64)), now);
    }

    assert_eq!(state.event_count(), MAX_EVENTS);
    assert_eq!(state.stats().total, (MAX_EVENTS + 25) as u64);
    let newest = state.visible()[0].event.duration_ms();
    assert_eq!(newest, Some((MAX_EVENTS + 24) as f64));
}

#[test]
fn test_unparseable_line_becomes_parse_error() {
    let now = Instant::now();
    let mut state = state(now);

    state.apply(Action::Line("{not json".into()), now);

    let entry = state.visible()[0].clone();
    assert!(entry.local);
    assert_eq!(entry.event.kind(), PARSE_ERROR);
    assert_eq!(entry.event.field("line").and_then(|v| v.as_str()), Some("{not json"));
    assert_eq!(state.stats().total, 0);
}

#[test]
fn test_connection_narrative() {
    let now = Instant::now();
    let mut state = state(now);
    assert_eq!(state.connection(), &ConnectionStatus::Connecting);

    state.apply(Action::Connected("127.0.0.1:7099".into()), now);
    assert_eq!(state.connection_label(), "connected 127.0.0.1:7099");

    state.apply(Action::Disconnected("connection closed".into()), now);
    state.apply(Action::AuthFailed("ERR Invalid Token".into()), now);

    assert_eq!(kinds(&state), vec![AUTH_FAILED, DISCONNECTED, CONNECTED]);
    let auth_failed = state.visible()[0].event.clone();
    assert_eq!(auth_failed.thread_name(), "ERR Invalid Token");
    assert_eq!(
        state.connection(),
        &ConnectionStatus::AuthFailed("ERR Invalid Token".into())
    );

    // Synthetic events never count as telemetry
    assert_eq!(state.stats().total, 0);
}

// =============================================================================
// Alerts and notices
// =============================================================================

#[test]
fn test_alert_banner_expires() {
    let now = Instant::now();
    let mut state = state(now);

    state.apply(line(&gc(750.0)), now);
    assert_eq!(state.banner(), Some("ALERT: GC Pause too high! 750.0ms"));

    state.tick(now + Duration::from_secs(4));
    assert!(state.banner().is_some());

    state.tick(now + BANNER_DURATION);
    assert!(state.banner().is_none());
}

#[test]
fn test_fast_gc_raises_no_banner() {
    let now = Instant::now();
    let mut state = state(now);

    state.apply(line(&gc(12.0)), now);
    assert!(state.banner().is_none());
}

#[test]
fn test_record_failure_stops_recording() {
    let now = Instant::now();
    let mut state = TuiState::new("h:1", AlertThresholds::default(), true, false, now);
    assert!(state.is_recording());

    state.apply(Action::RecordFailed("disk full".into()), now);
    assert!(!state.is_recording());
    assert_eq!(state.notice(), Some("Recording stopped: disk full"));
}

// =============================================================================
// Rate window
// =============================================================================

#[test]
fn test_rate_window_series() {
    let origin = Instant::now();
    let mut rate = RateWindow::new(origin);

    rate.record(origin);
    rate.record(origin);
    rate.record(origin + Duration::from_secs(3));

    let series = rate.series(origin + Duration::from_secs(3));
    assert_eq!(series.len(), RATE_WINDOW_SECS);
    assert_eq!(series[RATE_WINDOW_SECS - 1], 1);
    assert_eq!(series[RATE_WINDOW_SECS - 4], 2);
    assert_eq!(series.iter().sum::<u64>(), 3);
}

#[test]
fn test_rate_window_forgets_old_seconds() {
    let origin = Instant::now();
    let mut rate = RateWindow::new(origin);

    rate.record(origin);
    rate.record(origin + Duration::from_secs(25));

    let series = rate.series(origin + Duration::from_secs(25));
    assert_eq!(series.iter().sum::<u64>(), 1);
}

// =============================================================================
// Keys
// =============================================================================

#[test]
fn test_quit_keys() {
    let now = Instant::now();
    let mut state = state(now);

    assert_eq!(state.handle_key(key(KeyCode::Char('q')), now), KeyOutcome::Quit);
    assert_eq!(state.handle_key(key(KeyCode::Esc), now), KeyOutcome::Quit);
    assert_eq!(
        state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now),
        KeyOutcome::Quit
    );
}

#[test]
fn test_navigation_clamped() {
    let now = Instant::now();
    let mut state = state(now);
    for i in 0..30 {
        state.apply(line(&gc(i as f64)), now);
    }

    state.handle_key(key(KeyCode::Up), now);
    assert_eq!(state.selected(), 0);

    state.handle_key(key(KeyCode::Down), now);
    state.handle_key(key(KeyCode::PageDown), now);
    assert_eq!(state.selected(), 11);

    state.handle_key(key(KeyCode::End), now);
    assert_eq!(state.selected(), 29);

    state.handle_key(key(KeyCode::PageDown), now);
    assert_eq!(state.selected(), 29);

    state.handle_key(key(KeyCode::Home), now);
    assert_eq!(state.selected(), 0);
}

#[test]
fn test_filter_applies_on_enter_and_clears_on_esc() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(line(&gc(1.0)), now);
    state.apply(line(&park("http-nio-8080-exec-1")), now);

    state.handle_key(key(KeyCode::Char('/')), now);
    assert_eq!(state.mode(), &Mode::Filtering);

    for c in "HTTP".chars() {
        state.handle_key(key(KeyCode::Char(c)), now);
    }
    // Not applied while typing
    assert_eq!(state.visible().len(), 2);
    assert_eq!(state.filter_input().value(), "HTTP");

    state.handle_key(key(KeyCode::Enter), now);
    assert_eq!(state.mode(), &Mode::Normal);
    assert_eq!(state.filter(), "HTTP");
    assert_eq!(kinds(&state), vec!["jdk.ThreadPark"]);

    state.handle_key(key(KeyCode::Char('/')), now);
    state.handle_key(key(KeyCode::Esc), now);
    assert_eq!(state.filter(), "");
    assert_eq!(state.visible().len(), 2);
}

#[test]
fn test_filter_matches_kind_case_insensitively() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(line(&gc(1.0)), now);
    state.apply(line(&park("main")), now);

    state.handle_key(key(KeyCode::Char('/')), now);
    for c in "garbage".chars() {
        state.handle_key(key(KeyCode::Char(c)), now);
    }
    state.handle_key(key(KeyCode::Enter), now);

    assert_eq!(kinds(&state), vec!["jdk.GarbageCollection"]);
}

#[test]
fn test_detail_opens_selected_event() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(line(&gc(1.0)), now);
    state.apply(line(&park("main")), now);

    state.handle_key(key(KeyCode::Down), now);
    state.handle_key(key(KeyCode::Enter), now);

    match state.mode() {
        Mode::Detail(event) => assert_eq!(event.kind(), "jdk.GarbageCollection"),
        other => panic!("expected detail mode, got {other:?}"),
    }

    // Keys other than close are swallowed by the modal
    assert_eq!(state.handle_key(key(KeyCode::Char('b')), now), KeyOutcome::Continue);
    state.handle_key(key(KeyCode::Esc), now);
    assert_eq!(state.mode(), &Mode::Normal);
}

#[test]
fn test_detail_on_empty_list_stays_normal() {
    let now = Instant::now();
    let mut state = state(now);

    state.handle_key(key(KeyCode::Enter), now);
    assert_eq!(state.mode(), &Mode::Normal);
}

#[test]
fn test_pause_keeps_selected_event() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(line(&gc(1.0)), now);
    state.apply(line(&gc(2.0)), now);

    state.handle_key(key(KeyCode::Char('p')), now);
    assert!(state.is_paused());

    state.apply(line(&gc(3.0)), now);
    state.apply(line(&gc(4.0)), now);
    assert_eq!(state.selected(), 2);
    assert_eq!(
        state.selected_entry().unwrap().event.duration_ms(),
        Some(2.0)
    );

    state.handle_key(key(KeyCode::Char('p')), now);
    state.apply(line(&gc(5.0)), now);
    assert_eq!(state.selected(), 2);
}

#[test]
fn test_clear_resets_list_and_stats() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(line(&gc(1.0)), now);

    state.handle_key(key(KeyCode::Char('c')), now);

    assert_eq!(state.event_count(), 0);
    assert_eq!(state.stats(), &LocalStats::default());
    assert!(state.rate_series(now).iter().all(|c| *c == 0));
    assert_eq!(state.notice(), Some("Cleared"));
}

#[test]
fn test_toggles_and_bundle_key() {
    let now = Instant::now();
    let mut state = TuiState::new("h:1", AlertThresholds::default(), false, true, now);
    assert!(state.show_metrics());
    assert_eq!(state.metrics_status(), &MetricsStatus::Waiting);

    state.handle_key(key(KeyCode::Char('s')), now);
    assert!(!state.show_metrics());

    assert_eq!(state.handle_key(key(KeyCode::Char('b')), now), KeyOutcome::SaveBundle);
}

// =============================================================================
// Metrics and bundle
// =============================================================================

#[test]
fn test_metrics_error_keeps_last_snapshot() {
    let now = Instant::now();
    let mut state = TuiState::new("h:1", AlertThresholds::default(), false, true, now);

    let mut snapshot = StatsSnapshot::empty();
    snapshot.metrics.heap_used_bytes = 42;
    state.apply(Action::Metrics(Ok(snapshot)), now);
    assert_eq!(state.metrics_status(), &MetricsStatus::Ok);

    state.apply(Action::Metrics(Err("timed out".into())), now);
    assert_eq!(state.metrics_status(), &MetricsStatus::Err("timed out".into()));
    assert_eq!(state.metrics().unwrap().metrics.heap_used_bytes, 42);
}

#[test]
fn test_incident_bundle() {
    let now = Instant::now();
    let mut state = state(now);
    state.apply(Action::Connected("127.0.0.1:7099".into()), now);
    state.apply(line(&gc(3.0)), now);

    let bundle = state.incident_bundle(now);
    assert_eq!(bundle.target, "localhost:7099");
    assert_eq!(bundle.connection, "connected 127.0.0.1:7099");
    assert_eq!(bundle.stats.gc, 1);
    assert_eq!(bundle.events.len(), 2);
    assert_eq!(bundle.events[0].kind(), "jdk.GarbageCollection");
    assert_eq!(bundle.events_per_sec.len(), RATE_WINDOW_SECS);
    assert!(bundle.file_name().starts_with("jfr-incident-"));
    assert!(bundle.file_name().ends_with(".json"));

    let json = serde_json::to_value(&bundle).unwrap();
    assert_eq!(json["stats"]["total"], 1);
}
