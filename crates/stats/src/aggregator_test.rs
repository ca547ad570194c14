//! Tests for the stats aggregator

use super::*;
use std::sync::Arc;
use std::thread;

use jtail_protocol::FieldValue;

fn gc(pause_ms: f64) -> Event {
    Event::new("jdk.GarbageCollection")
        .unwrap()
        .with_duration_ms(pause_ms)
}

fn heap_summary(used: u64, committed: u64) -> Event {
    let used: FieldValue = [("used", FieldValue::from(used))].into_iter().collect();
    let committed: FieldValue = [("committed", FieldValue::from(committed))]
        .into_iter()
        .collect();
    Event::new("jdk.GCHeapSummary")
        .unwrap()
        .with_field("heapUsed", used)
        .with_field("heapCommitted", committed)
}

fn monitor_enter(thread: &str, wait_ms: f64) -> Event {
    Event::new("jdk.JavaMonitorEnter")
        .unwrap()
        .with_thread(thread)
        .with_duration_ms(wait_ms)
}

fn exception(class: &str) -> Event {
    Event::new("jdk.JavaExceptionThrow")
        .unwrap()
        .with_field("thrownClass", class)
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_new_aggregator_is_zeroed() {
    let stats = StatsAggregator::new(10);
    let snapshot = stats.snapshot();

    assert_eq!(snapshot.metrics, Counters::default());
    assert!(snapshot.history.is_empty());
    assert!(snapshot.last_event.is_none());
}

#[test]
fn test_gc_event_counts_and_records_pause() {
    let stats = StatsAggregator::new(10);
    stats.accept(&gc(42.5));

    assert_eq!(stats.total_events(), 1);
    assert_eq!(stats.gc_count(), 1);
    assert_eq!(stats.last_gc_pause_ms(), 42.5);
}

#[test]
fn test_gc_without_duration_keeps_last_pause() {
    let stats = StatsAggregator::new(10);
    stats.accept(&gc(12.0));
    stats.accept(&Event::new("jdk.GarbageCollection").unwrap());

    assert_eq!(stats.gc_count(), 2);
    assert_eq!(stats.last_gc_pause_ms(), 12.0);
}

#[test]
fn test_classification_is_case_insensitive() {
    let stats = StatsAggregator::new(10);
    stats.accept(&Event::new("GARBAGECOLLECTION").unwrap());
    stats.accept(&Event::new("threadPark").unwrap());

    assert_eq!(stats.gc_count(), 1);
    assert_eq!(stats.lock_count(), 1);
}

#[test]
fn test_heap_summary_last_write_wins() {
    let stats = StatsAggregator::new(10);
    stats.accept(&heap_summary(100 * 1024 * 1024, 512 * 1024 * 1024));
    stats.accept(&heap_summary(64 * 1024 * 1024, 256 * 1024 * 1024));

    let counters = stats.counters();
    assert_eq!(counters.heap_used_bytes, 64 * 1024 * 1024);
    assert_eq!(counters.heap_committed_bytes, 256 * 1024 * 1024);
    assert_eq!(counters.heap_used_mb, 64);
    assert_eq!(counters.heap_committed_mb, 256);
    // heap summaries are not GC events
    assert_eq!(counters.gc_count, 0);
}

#[test]
fn test_heap_summary_without_nested_fields_is_ignored() {
    let stats = StatsAggregator::new(10);
    stats.accept(&heap_summary(1024, 2048));
    stats.accept(&Event::new("jdk.GCHeapSummary").unwrap().with_field("heapUsed", 7u64));

    assert_eq!(stats.heap_used_bytes(), 1024);
    assert_eq!(stats.heap_committed_bytes(), 2048);
}

#[test]
fn test_lock_events_accumulate_blocked_time() {
    let stats = StatsAggregator::new(10);
    stats.accept(&monitor_enter("worker-1", 10.0));
    stats.accept(&monitor_enter("worker-2", 300.0));
    stats.accept(&monitor_enter("worker-1", 15.0));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.metrics.lock_count, 3);
    assert_eq!(
        snapshot.top_blocked_threads,
        vec![
            TopEntry {
                name: "worker-2".into(),
                value: 300.0
            },
            TopEntry {
                name: "worker-1".into(),
                value: 25.0
            },
        ]
    );
}

#[test]
fn test_lock_event_without_thread_only_counts() {
    let stats = StatsAggregator::new(10);
    stats.accept(&Event::new("jdk.ThreadPark").unwrap().with_duration_ms(50.0));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.metrics.lock_count, 1);
    assert!(snapshot.top_blocked_threads.is_empty());
}

#[test]
fn test_exceptions_counted_by_class() {
    let stats = StatsAggregator::new(10);
    stats.accept(&exception("java.io.IOException"));
    stats.accept(&exception("java.lang.IllegalStateException"));
    stats.accept(&exception("java.io.IOException"));
    stats.accept(&Event::new("jdk.JavaExceptionThrow").unwrap());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.metrics.exception_count, 4);
    assert_eq!(snapshot.top_exceptions[0].name, "java.io.IOException");
    assert_eq!(snapshot.top_exceptions[0].value, 2);
    assert_eq!(snapshot.top_exceptions.len(), 2);
}

#[test]
fn test_top_tables_truncated_to_k() {
    let stats = StatsAggregator::with_top_k(10, 2);
    for class in ["A", "B", "C", "A"] {
        stats.accept(&exception(class));
    }

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.top_exceptions.len(), 2);
    assert_eq!(snapshot.top_exceptions[0].name, "A");
}

#[test]
fn test_other_kinds_only_count_totals() {
    let stats = StatsAggregator::new(10);
    stats.accept(&Event::new("jdk.CPULoad").unwrap());

    let counters = stats.counters();
    assert_eq!(counters.total_events, 1);
    assert_eq!(counters.gc_count + counters.lock_count + counters.exception_count, 0);
}

// ============================================================================
// History and snapshot
// ============================================================================

#[test]
fn test_per_kind_counts() {
    let stats = StatsAggregator::new(10);
    stats.accept(&gc(1.0));
    stats.accept(&gc(2.0));
    stats.accept(&Event::new("jdk.CPULoad").unwrap());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.event_counts.get("jdk.GarbageCollection"), Some(&2));
    assert_eq!(snapshot.event_counts.get("jdk.CPULoad"), Some(&1));
}

#[test]
fn test_history_is_fifo_and_bounded() {
    let stats = StatsAggregator::new(3);
    for pause in [1.0, 2.0, 3.0, 4.0] {
        stats.accept(&gc(pause));
    }

    let pauses: Vec<f64> = stats
        .history()
        .iter()
        .filter_map(Event::duration_ms)
        .collect();
    assert_eq!(pauses, vec![2.0, 3.0, 4.0]);
    assert_eq!(stats.total_events(), 4);
}

#[test]
fn test_last_event_tracks_most_recent() {
    let stats = StatsAggregator::new(3);
    stats.accept(&gc(1.0));
    stats.accept(&exception("X"));

    let last = stats.snapshot().last_event.unwrap();
    assert_eq!(last.kind(), "jdk.JavaExceptionThrow");
}

#[test]
fn test_snapshot_does_not_alias_state() {
    let stats = StatsAggregator::new(5);
    stats.accept(&gc(1.0));
    let before = stats.snapshot();

    stats.accept(&gc(2.0));
    stats.accept(&exception("X"));

    assert_eq!(before.metrics.total_events, 1);
    assert_eq!(before.history.len(), 1);
    assert!(before.top_exceptions.is_empty());
}

#[test]
fn test_snapshot_json_shape() {
    let stats = StatsAggregator::new(5);
    stats.accept(&gc(750.0));

    let json = serde_json::to_value(stats.snapshot()).unwrap();
    assert_eq!(json["metrics"]["gc_count"], 1);
    assert_eq!(json["metrics"]["last_gc_pause_ms"], 750.0);
    assert_eq!(json["last_event"]["event"], "jdk.GarbageCollection");
    assert!(json["history"].is_array());

    let parsed: StatsSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.metrics.gc_count, 1);
}

#[test]
fn test_clear_resets_everything() {
    let stats = StatsAggregator::new(5);
    stats.accept(&gc(9.0));
    stats.accept(&exception("X"));
    stats.accept(&heap_summary(10, 20));
    stats.clear();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.metrics, Counters::default());
    assert!(snapshot.history.is_empty());
    assert!(snapshot.event_counts.is_empty());
    assert!(snapshot.top_exceptions.is_empty());
    assert!(snapshot.last_event.is_none());
}

#[test]
fn test_counters_exposition_names() {
    let stats = StatsAggregator::new(5);
    stats.accept(&gc(3.0));

    let lines = stats.counters().exposition();
    let names: Vec<&str> = lines.iter().map(|(name, _)| *name).collect();
    assert!(names.contains(&"jfrtail_events_total"));
    assert!(names.contains(&"jfrtail_heap_committed_bytes"));
    assert!(lines.contains(&("jfrtail_gc_count", "1".to_string())));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_accept_loses_nothing() {
    let stats = Arc::new(StatsAggregator::new(50));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        stats.accept(&gc(1.0));
                    } else {
                        stats.accept(&exception(&format!("E{worker}")));
                    }
                }
            })
        })
        .collect();

    // snapshots taken during ingestion stay within bounds
    for _ in 0..20 {
        assert!(stats.snapshot().history.len() <= 50);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let counters = stats.counters();
    assert_eq!(counters.total_events, 4000);
    assert_eq!(counters.gc_count, 2000);
    assert_eq!(counters.exception_count, 2000);
    assert_eq!(stats.history().len(), 50);
}
