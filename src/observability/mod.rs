//! Structured logging and run metrics.
//!
//! - [`init_logging`]: one-time `tracing` setup with `RUST_LOG` support
//! - [`RunMetrics`]: counters for one analysis run

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `depscope=info` when `RUST_LOG` is not set. Logs go to stderr
/// so that JSON on stdout stays machine-readable. Subsequent calls are
/// ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("depscope=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Counters collected by one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub dirs_visited: usize,
    pub files_visited: usize,
    /// Files with a recognized extension that parsed cleanly.
    pub files_parsed: usize,
    pub parse_failures: usize,
    pub excluded_entries: usize,
    pub import_edges: usize,
    pub call_edges: usize,
    pub dependencies: usize,
    pub duration_ms: Option<u64>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_duration(&mut self, elapsed: Duration) {
        self.duration_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
