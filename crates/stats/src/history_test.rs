//! Tests for the history buffer

use super::*;

/// Helper to create an event whose pid identifies it
fn make_event(id: u64) -> Event {
    Event::new("jdk.CPULoad").unwrap().with_pid(id)
}

fn pids(events: &[Event]) -> Vec<u64> {
    events.iter().map(Event::process_id).collect()
}

// ============================================================================
// Basic operations
// ============================================================================

#[test]
fn test_new_buffer_is_empty() {
    let buffer = HistoryBuffer::with_capacity(4);
    assert!(buffer.is_empty());
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.capacity(), 4);
}

#[test]
fn test_push_keeps_arrival_order() {
    let buffer = HistoryBuffer::with_capacity(4);
    for i in 1..=3 {
        buffer.push(make_event(i));
    }

    assert_eq!(pids(&buffer.to_vec()), vec![1, 2, 3]);
}

#[test]
fn test_zero_capacity_is_clamped() {
    let buffer = HistoryBuffer::with_capacity(0);
    assert_eq!(buffer.capacity(), 1);

    buffer.push(make_event(1));
    buffer.push(make_event(2));
    assert_eq!(pids(&buffer.to_vec()), vec![2]);
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_full_buffer_evicts_oldest() {
    let buffer = HistoryBuffer::with_capacity(3);
    for i in 1..=5 {
        buffer.push(make_event(i));
    }

    assert_eq!(buffer.len(), 3);
    assert_eq!(pids(&buffer.to_vec()), vec![3, 4, 5]);
}

#[test]
fn test_length_never_exceeds_capacity() {
    let buffer = HistoryBuffer::with_capacity(10);
    for i in 0..1000 {
        buffer.push(make_event(i));
        assert!(buffer.len() <= 10);
    }
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_copy_is_detached() {
    let buffer = HistoryBuffer::with_capacity(2);
    buffer.push(make_event(1));
    let copy = buffer.to_vec();

    buffer.push(make_event(2));
    buffer.push(make_event(3));

    assert_eq!(pids(&copy), vec![1]);
}

#[test]
fn test_clear() {
    let buffer = HistoryBuffer::with_capacity(4);
    buffer.push(make_event(1));
    buffer.clear();

    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 4);
}
