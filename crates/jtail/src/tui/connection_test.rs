//! Tests for the hub connection task

use super::*;

use std::net::SocketAddr;
use std::sync::Arc;

use jtail_auth::TokenGate;
use jtail_protocol::{Event, decode_event_line};
use jtail_tap::{TapPoint, TapServer, TapServerConfig};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

struct Hub {
    tap_point: Arc<TapPoint>,
    addr: SocketAddr,
    cancel: CancellationToken,
}

async fn start_hub(require_auth: bool) -> Hub {
    let tap_point = Arc::new(TapPoint::new());
    let config = TapServerConfig::default()
        .with_addr(SocketAddr::from(([127, 0, 0, 1], 0)))
        .with_require_auth(require_auth);
    let server = TapServer::bind(
        Arc::clone(&tap_point),
        TokenGate::new("s3cret").unwrap(),
        config,
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    let cancel = CancellationToken::new();
    server.spawn(cancel.clone());

    Hub {
        tap_point,
        addr,
        cancel,
    }
}

fn spawn_connection(
    connection: Connection,
    cancel: &CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(connection.run(cancel.clone()))
}

async fn next_action(rx: &mut UnboundedReceiver<Action>) -> Action {
    tokio::time::timeout(IO_TIMEOUT, rx.recv())
        .await
        .unwrap()
        .unwrap()
}

async fn stop(cancel: CancellationToken, handle: JoinHandle<()>) {
    cancel.cancel();
    tokio::time::timeout(IO_TIMEOUT, handle)
        .await
        .unwrap()
        .unwrap();
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn test_authenticated_stream() {
    let hub = start_hub(true).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let token = jtail_auth::issue("s3cret", 60).unwrap();
    let cancel = CancellationToken::new();

    let credential = Some(Credential::Token(token));
    let handle = spawn_connection(Connection::new(hub.addr.to_string(), credential, tx), &cancel);

    assert_eq!(next_action(&mut rx).await, Action::Connected(hub.addr.to_string()));

    let event = Event::new("jdk.GarbageCollection")
        .unwrap()
        .with_duration_ms(750.0);
    hub.tap_point.publish(&event);

    match next_action(&mut rx).await {
        Action::Line(line) => assert_eq!(decode_event_line(&line).unwrap(), event),
        other => panic!("expected a line, got {other:?}"),
    }

    stop(cancel, handle).await;
    hub.cancel.cancel();
}

#[tokio::test]
async fn test_invalid_token_reported_and_retried() {
    let hub = start_hub(true).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let token = jtail_auth::issue("wrong", 60).unwrap();
    let cancel = CancellationToken::new();

    let connection = Connection::new(hub.addr.to_string(), Some(Credential::Token(token)), tx)
        .with_retry_delay(Duration::from_millis(10));
    let handle = spawn_connection(connection, &cancel);

    assert_eq!(
        next_action(&mut rx).await,
        Action::AuthFailed("ERR Invalid Token".into())
    );
    // Retried after the backoff
    assert_eq!(
        next_action(&mut rx).await,
        Action::AuthFailed("ERR Invalid Token".into())
    );

    stop(cancel, handle).await;
    hub.cancel.cancel();
}

#[tokio::test]
async fn test_secret_mints_token_per_attempt() {
    let hub = start_hub(true).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let credential = Some(Credential::Secret("s3cret".into()));
    let handle = spawn_connection(Connection::new(hub.addr.to_string(), credential, tx), &cancel);
    assert_eq!(next_action(&mut rx).await, Action::Connected(hub.addr.to_string()));

    stop(cancel, handle).await;
    hub.cancel.cancel();
}

#[tokio::test]
async fn test_open_hub_without_token() {
    let hub = start_hub(false).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let handle = spawn_connection(Connection::new(hub.addr.to_string(), None, tx), &cancel);
    assert_eq!(next_action(&mut rx).await, Action::Connected(hub.addr.to_string()));

    stop(cancel, handle).await;
    hub.cancel.cancel();
}

// =============================================================================
// Reconnect
// =============================================================================

async fn refused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn test_refused_connection_reports_disconnect() {
    let addr = refused_addr().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let handle = spawn_connection(Connection::new(addr.to_string(), None, tx), &cancel);

    match next_action(&mut rx).await {
        Action::Disconnected(reason) => assert!(reason.contains("failed to connect")),
        other => panic!("expected a disconnect, got {other:?}"),
    }

    // Cancelling during the backoff sleep ends the task promptly
    stop(cancel, handle).await;
}

#[tokio::test]
async fn test_hub_shutdown_reports_disconnect() {
    let hub = start_hub(false).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let handle = spawn_connection(Connection::new(hub.addr.to_string(), None, tx), &cancel);
    assert_eq!(next_action(&mut rx).await, Action::Connected(hub.addr.to_string()));

    hub.cancel.cancel();
    match next_action(&mut rx).await {
        Action::Disconnected(_) => {}
        other => panic!("expected a disconnect, got {other:?}"),
    }

    stop(cancel, handle).await;
}

// =============================================================================
// Recording
// =============================================================================

#[tokio::test]
async fn test_lines_recorded() {
    let hub = start_hub(false).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let record = tempfile::NamedTempFile::new().unwrap();
    let file = File::create(record.path()).await.unwrap();

    let connection = Connection::new(hub.addr.to_string(), None, tx).with_record(file);
    let handle = spawn_connection(connection, &cancel);
    assert_eq!(next_action(&mut rx).await, Action::Connected(hub.addr.to_string()));

    hub.tap_point.publish(&Event::new("jdk.CPULoad").unwrap());
    hub.tap_point.publish(&Event::new("jdk.ThreadPark").unwrap());
    for _ in 0..2 {
        assert!(matches!(next_action(&mut rx).await, Action::Line(_)));
    }

    let contents = std::fs::read_to_string(record.path()).unwrap();
    let kinds: Vec<String> = contents
        .lines()
        .map(|l| decode_event_line(l).unwrap().kind().to_string())
        .collect();
    assert_eq!(kinds, vec!["jdk.CPULoad", "jdk.ThreadPark"]);

    stop(cancel, handle).await;
    hub.cancel.cancel();
}

// =============================================================================
// Line framing
// =============================================================================

/// A hub that writes `bytes` to the first peer and then holds the socket open
async fn raw_hub(bytes: &'static [u8]) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(bytes).await.unwrap();
        tokio::time::sleep(IO_TIMEOUT).await;
    });
    addr
}

#[tokio::test]
async fn test_invalid_utf8_line_keeps_session_alive() {
    let addr = raw_hub(
        b"OK Welcome\n\xff\xfe\n{\"event\":\"jdk.GarbageCollection\",\"duration_ms\":12.5}\n",
    )
    .await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let handle = spawn_connection(Connection::new(addr.to_string(), None, tx), &cancel);
    assert_eq!(next_action(&mut rx).await, Action::Connected(addr.to_string()));

    match next_action(&mut rx).await {
        Action::Line(line) => assert_eq!(line, "\u{FFFD}\u{FFFD}"),
        other => panic!("expected the corrupt line, got {other:?}"),
    }
    match next_action(&mut rx).await {
        Action::Line(line) => {
            let event = decode_event_line(&line).unwrap();
            assert_eq!(event.kind(), "jdk.GarbageCollection");
        }
        other => panic!("expected an event line, got {other:?}"),
    }

    stop(cancel, handle).await;
}

#[tokio::test]
async fn test_read_line_capped_strips_terminators() {
    let mut input: &[u8] = b"first\r\nsecond\nlast";

    assert_eq!(read_line_capped(&mut input).await.unwrap().as_deref(), Some("first"));
    assert_eq!(read_line_capped(&mut input).await.unwrap().as_deref(), Some("second"));
    assert_eq!(read_line_capped(&mut input).await.unwrap().as_deref(), Some("last"));
    assert_eq!(read_line_capped(&mut input).await.unwrap(), None);
}

#[tokio::test]
async fn test_read_line_capped_drops_overlong_tail() {
    let mut bytes = vec![b'x'; MAX_LINE_LENGTH + 100];
    bytes.extend_from_slice(b"\nnext\n");
    let mut input: &[u8] = &bytes;

    let first = read_line_capped(&mut input).await.unwrap().unwrap();
    assert_eq!(first.len(), MAX_LINE_LENGTH);
    assert_eq!(read_line_capped(&mut input).await.unwrap().as_deref(), Some("next"));
}
