//! Metrics registry for aerotab
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Lock-free; safe to share between invocations on different objects

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters
///
/// Uses Relaxed ordering; counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
    /// Queries answered through at least one index
    index_queries: AtomicU64,
    batches_read: AtomicU64,
    rows_scanned: AtomicU64,
    rows_returned: AtomicU64,
    index_builds: AtomicU64,
    index_entries_written: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Query metrics

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_queries(&self) {
        self.index_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_batches_read(&self, n: u64) {
        self.batches_read.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_rows_scanned(&self, n: u64) {
        self.rows_scanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_rows_returned(&self, n: u64) {
        self.rows_returned.fetch_add(n, Ordering::Relaxed);
    }

    // Index metrics

    pub fn increment_index_builds(&self) {
        self.index_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_index_entries(&self, n: u64) {
        self.index_entries_written.fetch_add(n, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            index_queries: self.index_queries.load(Ordering::Relaxed),
            batches_read: self.batches_read.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            index_builds: self.index_builds.load(Ordering::Relaxed),
            index_entries_written: self.index_entries_written.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub index_queries: u64,
    pub batches_read: u64,
    pub rows_scanned: u64,
    pub rows_returned: u64,
    pub index_builds: u64,
    pub index_entries_written: u64,
}

impl MetricsSnapshot {
    /// Renders the snapshot as one JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
