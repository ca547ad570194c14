//! Stats command - Print the aggregate of a running monitor
//!
//! # Usage
//!
//! ```bash
//! jtail stats --secret s3cret
//! jtail stats --token "$TOKEN" --json
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use jtail_stats::StatsSnapshot;

use crate::client::MonitorClient;
use crate::cmd::{CredentialArgs, web_base_url};
use crate::format::{format_bytes, format_millis, format_number};

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Monitor host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Monitor HTTP port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the stats command
pub async fn run(args: StatsArgs) -> Result<()> {
    let token = args.credentials.require("stats")?;
    let client = MonitorClient::new(
        web_base_url(&args.host, args.port),
        token,
        Duration::from_secs(5),
    )?;

    let snapshot = client.snapshot().await?;

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("failed to encode stats")?;
        println!("{}", json);
    } else {
        print!("{}", render_text(&snapshot, client.base_url()));
    }

    Ok(())
}

fn render_text(snapshot: &StatsSnapshot, base_url: &str) -> String {
    let m = &snapshot.metrics;
    let mut out = String::new();

    out.push_str("jtail Monitor Stats\n");
    out.push_str("===================\n");
    out.push_str(&format!("Monitor:     {}\n", base_url));
    out.push_str(&format!("Snapshot:    {}\n", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push('\n');

    out.push_str("Events\n");
    out.push_str(&format!("  Total:       {}\n", format_number(m.total_events)));
    out.push_str(&format!("  GC:          {}\n", format_number(m.gc_count)));
    out.push_str(&format!("  Locks:       {}\n", format_number(m.lock_count)));
    out.push_str(&format!("  Exceptions:  {}\n", format_number(m.exception_count)));
    out.push('\n');

    out.push_str("Heap\n");
    out.push_str(&format!(
        "  Used:        {} / {}\n",
        format_bytes(m.heap_used_bytes),
        format_bytes(m.heap_committed_bytes)
    ));
    out.push_str(&format!("  Last pause:  {}\n", format_millis(m.last_gc_pause_ms)));

    if !snapshot.top_exceptions.is_empty() {
        out.push('\n');
        out.push_str("Top exceptions\n");
        for entry in &snapshot.top_exceptions {
            out.push_str(&format!("  {:>8}  {}\n", format_number(entry.value), entry.name));
        }
    }

    if !snapshot.top_blocked_threads.is_empty() {
        out.push('\n');
        out.push_str("Top blocked threads\n");
        for entry in &snapshot.top_blocked_threads {
            out.push_str(&format!("  {:>8}  {}\n", format_millis(entry.value), entry.name));
        }
    }

    if !snapshot.event_counts.is_empty() {
        out.push('\n');
        out.push_str("By kind\n");
        for (kind, count) in &snapshot.event_counts {
            out.push_str(&format!("  {:>8}  {}\n", format_number(*count), kind));
        }
    }

    out
}
