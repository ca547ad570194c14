//! Response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

use jtail_protocol::Event;
use jtail_stats::StatsSnapshot;

/// Host description attached to an incident bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub runtime_version: String,
    pub processors: usize,
    pub total_memory_bytes: u64,
    pub pid: u32,
}

impl Environment {
    /// Describe the current host and process
    pub fn capture() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        Self {
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            os_version: System::os_version().unwrap_or_default(),
            arch: std::env::consts::ARCH.to_string(),
            runtime_version: format!("jtail {}", env!("CARGO_PKG_VERSION")),
            processors: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            total_memory_bytes: sys.total_memory(),
            pid: std::process::id(),
        }
    }
}

/// Downloadable incident bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub generated_at: DateTime<Utc>,
    pub snapshot: StatsSnapshot,
    pub history: Vec<Event>,
    pub environment: Environment,
}
