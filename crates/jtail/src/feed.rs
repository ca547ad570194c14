//! Event feeds
//!
//! Producers of events for `jtail serve`:
//! - JSON lines, one event per line, from stdin (`-`) or a file
//! - A synthetic demo stream covering every event category

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use jtail_protocol::{Event, FieldValue, decode_event_line};
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::monitor::EventSink;

/// Path that selects stdin
pub const STDIN_PATH: &str = "-";

/// Default pause between synthetic events
pub const DEFAULT_DEMO_INTERVAL: Duration = Duration::from_millis(200);

/// Totals for a finished feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Events handed to the sink
    pub ingested: u64,
    /// Lines that failed to decode
    pub skipped: u64,
}

/// Run a JSON-lines feed from stdin or a file until EOF or cancellation
pub async fn run_jsonl_path(
    path: &str,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) -> Result<FeedSummary> {
    if path == STDIN_PATH {
        info!("reading events from stdin");
        return run_jsonl(BufReader::new(tokio::io::stdin()), sink, cancel).await;
    }

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open feed {}", path))?;
    info!(path = %path, "reading events from file");
    run_jsonl(BufReader::new(file), sink, cancel).await
}

/// Run a JSON-lines feed from any buffered reader
///
/// Blank lines are ignored. Lines that do not decode are logged and
/// counted but never stop the feed.
pub async fn run_jsonl<R>(
    reader: R,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) -> Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();
    let mut line_no: u64 = 0;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("failed to read feed")?,
        };

        let Some(line) = line else {
            break;
        };
        line_no += 1;

        if line.trim().is_empty() {
            continue;
        }

        match decode_event_line(&line) {
            Ok(event) => {
                sink.ingest(event);
                summary.ingested += 1;
            }
            Err(e) => {
                summary.skipped += 1;
                warn!(line = line_no, error = %e, "skipping undecodable feed line");
            }
        }
    }

    info!(
        ingested = summary.ingested,
        skipped = summary.skipped,
        "feed finished"
    );
    Ok(summary)
}

/// Run the synthetic demo feed until cancelled
pub async fn run_demo(
    sink: Arc<dyn EventSink>,
    interval: Duration,
    cancel: CancellationToken,
) -> FeedSummary {
    info!(interval_ms = interval.as_millis() as u64, "starting demo feed");

    let mut generator = DemoGenerator::new();
    let mut ticker = tokio::time::interval(interval);
    let mut summary = FeedSummary::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(event) = generator.next_event() {
                    debug!(kind = %event.kind(), "demo event");
                    sink.ingest(event);
                    summary.ingested += 1;
                }
            }
        }
    }

    summary
}

const DEMO_THREADS: [&str; 4] = ["main", "http-nio-8080-exec-1", "worker-2", "scheduler-1"];

const DEMO_EXCEPTIONS: [&str; 4] = [
    "java.lang.IllegalStateException",
    "java.io.IOException",
    "java.lang.NullPointerException",
    "java.util.concurrent.TimeoutException",
];

const DEMO_MONITORS: [&str; 3] = [
    "java.util.concurrent.ConcurrentHashMap",
    "com.example.OrderCache",
    "java.lang.Object",
];

const MB: u64 = 1024 * 1024;

/// Produces plausible JVM events with random values
pub struct DemoGenerator {
    pid: u64,
    heap_used: u64,
    heap_committed: u64,
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self {
            pid: std::process::id() as u64,
            heap_used: 256 * MB,
            heap_committed: 1024 * MB,
        }
    }

    /// Next event, weighted towards the frequent kinds
    pub fn next_event(&mut self) -> Option<Event> {
        let mut rng = rand::rng();
        let roll = rng.random_range(0..100);

        let event = match roll {
            0..20 => self.gc(&mut rng),
            20..40 => self.heap_summary(&mut rng),
            40..55 => self.monitor_enter(&mut rng),
            55..70 => self.thread_park(&mut rng),
            70..80 => self.exception(&mut rng),
            _ => self.cpu_load(&mut rng),
        };

        Some(event?.at(Utc::now()).with_pid(self.pid))
    }

    fn gc(&mut self, rng: &mut impl Rng) -> Option<Event> {
        // Occasional long pause so alerts have something to fire on
        let pause = if rng.random_bool(0.1) {
            rng.random_range(500.0..1200.0)
        } else {
            rng.random_range(1.0..60.0)
        };
        self.heap_used = self.heap_used.saturating_sub(rng.random_range(32..128) * MB);

        let event = Event::new("jdk.GarbageCollection").ok()?;
        Some(
            event
                .with_duration_ms(round1(pause))
                .with_field("name", if pause > 200.0 { "G1Old" } else { "G1New" })
                .with_field("cause", "G1 Evacuation Pause"),
        )
    }

    fn heap_summary(&mut self, rng: &mut impl Rng) -> Option<Event> {
        self.heap_used = (self.heap_used + rng.random_range(1..24) * MB).min(self.heap_committed);

        let event = Event::new("jdk.GCHeapSummary").ok()?;
        Some(
            event
                .with_field("when", "After GC")
                .with_field("heapUsed", FieldValue::from_iter([("used", self.heap_used)]))
                .with_field(
                    "heapCommitted",
                    FieldValue::from_iter([("committed", self.heap_committed)]),
                ),
        )
    }

    fn monitor_enter(&mut self, rng: &mut impl Rng) -> Option<Event> {
        let event = Event::new("jdk.JavaMonitorEnter").ok()?;
        Some(
            event
                .with_thread(pick(rng, &DEMO_THREADS))
                .with_duration_ms(round1(rng.random_range(0.5..1500.0)))
                .with_field("monitorClass", pick(rng, &DEMO_MONITORS)),
        )
    }

    fn thread_park(&mut self, rng: &mut impl Rng) -> Option<Event> {
        let event = Event::new("jdk.ThreadPark").ok()?;
        Some(
            event
                .with_thread(pick(rng, &DEMO_THREADS))
                .with_duration_ms(round1(rng.random_range(1.0..2000.0)))
                .with_field(
                    "parkedClass",
                    "java.util.concurrent.locks.AbstractQueuedSynchronizer",
                ),
        )
    }

    fn exception(&mut self, rng: &mut impl Rng) -> Option<Event> {
        let event = Event::new("jdk.ExceptionThrown").ok()?;
        Some(
            event
                .with_thread(pick(rng, &DEMO_THREADS))
                .with_field("thrownClass", pick(rng, &DEMO_EXCEPTIONS))
                .with_field("message", "demo failure"),
        )
    }

    fn cpu_load(&mut self, rng: &mut impl Rng) -> Option<Event> {
        let user: f64 = rng.random_range(0.05..0.6);
        let system: f64 = rng.random_range(0.01..0.1);

        let event = Event::new("jdk.CPULoad").ok()?;
        Some(
            event
                .with_field("jvmUser", round3(user))
                .with_field("jvmSystem", round3(system))
                .with_field("machineTotal", round3((user + system + 0.1).min(1.0))),
        )
    }
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
