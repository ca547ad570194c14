//! Tests for subscriber management

use super::*;

fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

fn line(text: &str) -> Arc<str> {
    Arc::from(format!("{text}\n"))
}

// ============================================================================
// SubscriberManager tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_creates_subscriber() {
    let manager = SubscriberManager::new();

    let (id, _rx) = manager.subscribe(peer()).unwrap();
    assert!(id > 0);
    assert_eq!(manager.count(), 1);
}

#[tokio::test]
async fn test_subscribe_unique_ids() {
    let manager = SubscriberManager::new();

    let (id1, _rx1) = manager.subscribe(peer()).unwrap();
    let (id2, _rx2) = manager.subscribe(peer()).unwrap();

    assert_ne!(id1, id2);
    assert_eq!(manager.count(), 2);
}

#[tokio::test]
async fn test_unsubscribe_removes_subscriber() {
    let manager = SubscriberManager::new();

    let (id, _rx) = manager.subscribe(peer()).unwrap();
    manager.unsubscribe(id).unwrap();
    assert_eq!(manager.count(), 0);
}

#[tokio::test]
async fn test_unsubscribe_not_found() {
    let manager = SubscriberManager::new();
    let result = manager.unsubscribe(999_999);

    assert!(matches!(
        result,
        Err(TapError::SubscriberNotFound { id: 999_999 })
    ));
}

#[tokio::test]
async fn test_max_subscribers_enforced() {
    let manager = SubscriberManager::with_limits(2, 8);

    let (_id1, _rx1) = manager.subscribe(peer()).unwrap();
    let (_id2, _rx2) = manager.subscribe(peer()).unwrap();
    let result = manager.subscribe(peer());

    assert!(matches!(result, Err(TapError::MaxSubscribers { max: 2 })));
}

#[tokio::test]
async fn test_has_subscribers() {
    let manager = SubscriberManager::new();
    assert!(!manager.has_subscribers());

    let (id, _rx) = manager.subscribe(peer()).unwrap();
    assert!(manager.has_subscribers());

    manager.unsubscribe(id).unwrap();
    assert!(!manager.has_subscribers());
}

// ============================================================================
// Broadcast tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_subscriber() {
    let manager = SubscriberManager::new();
    let (_id1, mut rx1) = manager.subscribe(peer()).unwrap();
    let (_id2, mut rx2) = manager.subscribe(peer()).unwrap();

    let outcome = manager.broadcast(line("a"));

    assert_eq!(outcome, BroadcastOutcome { delivered: 2, dropped: 0 });
    assert_eq!(&*rx1.recv().await.unwrap(), "a\n");
    assert_eq!(&*rx2.recv().await.unwrap(), "a\n");
}

#[tokio::test]
async fn test_broadcast_preserves_order() {
    let manager = SubscriberManager::new();
    let (_id, mut rx) = manager.subscribe(peer()).unwrap();

    for text in ["1", "2", "3"] {
        manager.broadcast(line(text));
    }

    assert_eq!(&*rx.recv().await.unwrap(), "1\n");
    assert_eq!(&*rx.recv().await.unwrap(), "2\n");
    assert_eq!(&*rx.recv().await.unwrap(), "3\n");
}

#[tokio::test]
async fn test_broadcast_drops_full_subscriber() {
    let manager = SubscriberManager::with_limits(10, 2);
    let (_slow, _slow_rx) = manager.subscribe(peer()).unwrap();
    let (_fast, mut fast_rx) = manager.subscribe(peer()).unwrap();

    manager.broadcast(line("1"));
    fast_rx.recv().await.unwrap();
    manager.broadcast(line("2"));
    fast_rx.recv().await.unwrap();

    // slow queue is now full
    let outcome = manager.broadcast(line("3"));

    assert_eq!(outcome, BroadcastOutcome { delivered: 1, dropped: 1 });
    assert_eq!(manager.count(), 1);
    assert_eq!(&*fast_rx.recv().await.unwrap(), "3\n");
}

#[tokio::test]
async fn test_broadcast_drops_closed_subscriber() {
    let manager = SubscriberManager::new();
    let (_id1, rx1) = manager.subscribe(peer()).unwrap();
    let (_id2, mut rx2) = manager.subscribe(peer()).unwrap();
    drop(rx1);

    let outcome = manager.broadcast(line("x"));

    assert_eq!(outcome.delivered, 1);
    assert_eq!(outcome.dropped, 1);
    assert_eq!(manager.count(), 1);
    assert!(rx2.recv().await.is_some());
}

#[tokio::test]
async fn test_dropped_subscriber_sees_closed_queue() {
    let manager = SubscriberManager::with_limits(10, 1);
    let (_id, mut rx) = manager.subscribe(peer()).unwrap();

    manager.broadcast(line("1"));
    manager.broadcast(line("2"));

    // the queued line drains, then the channel reports closed
    assert_eq!(&*rx.recv().await.unwrap(), "1\n");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_cleanup_disconnected() {
    let manager = SubscriberManager::new();
    let (_id1, rx1) = manager.subscribe(peer()).unwrap();
    let (_id2, _rx2) = manager.subscribe(peer()).unwrap();
    drop(rx1);

    assert_eq!(manager.cleanup_disconnected(), 1);
    assert_eq!(manager.count(), 1);
}

#[tokio::test]
async fn test_clear_closes_all_queues() {
    let manager = SubscriberManager::new();
    let (_id, mut rx) = manager.subscribe(peer()).unwrap();

    assert_eq!(manager.clear(), 1);
    assert!(rx.recv().await.is_none());
}
