//! Counters describing how much work the index and search engine performed.
//!
//! Purely observational: nothing reads these counters back to make decisions.
//! Relaxed atomics so read paths can tick them through `&self`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts secondary-map reads performed by the index accessors.
#[derive(Debug, Default)]
pub struct IndexMetrics {
    map_reads: AtomicU64,
}

impl IndexMetrics {
    pub(crate) fn record_read(&self) {
        self.map_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn map_read_count(&self) -> u64 {
        self.map_reads.load(Ordering::Relaxed)
    }
}

impl Clone for IndexMetrics {
    fn clone(&self) -> Self {
        Self {
            map_reads: AtomicU64::new(self.map_read_count()),
        }
    }
}

/// Counts set-membership checks performed during intersection.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    set_checks: AtomicU64,
}

impl SearchMetrics {
    pub(crate) fn record_check(&self) {
        self.set_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_check_count(&self) -> u64 {
        self.set_checks.load(Ordering::Relaxed)
    }
}

impl Clone for SearchMetrics {
    fn clone(&self) -> Self {
        Self {
            set_checks: AtomicU64::new(self.set_check_count()),
        }
    }
}
