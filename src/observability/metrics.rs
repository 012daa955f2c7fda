//! Per-array counters
//!
//! - Counters only, monotonic
//! - Thread-safe, lock-free
//!
//! Relaxed ordering: counters are read for reporting, never to
//! synchronize cursor state.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one between array and every cursor created from it
#[derive(Debug, Default)]
pub struct GridMetrics {
    /// Chunk positions yielded by grid cursors
    chunks_yielded: AtomicU64,
    /// Storage `set_position` probes issued by the merge
    storage_probes: AtomicU64,
    /// Probes that found no chunk
    probe_misses: AtomicU64,
    /// Cells on which the predicate was evaluated
    cells_evaluated: AtomicU64,
    /// Materialized chunks served from the cache
    cache_hits: AtomicU64,
    /// Materialized chunks computed because the cache had none
    cache_misses: AtomicU64,
    /// Materialized chunks evicted
    cache_evictions: AtomicU64,
}

impl GridMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_chunks_yielded(&self) {
        self.chunks_yielded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_storage_probes(&self) {
        self.storage_probes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_probe_misses(&self) {
        self.probe_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cells_evaluated(&self) {
        self.cells_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_evictions(&self) {
        self.cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> GridMetricsSnapshot {
        GridMetricsSnapshot {
            chunks_yielded: self.chunks_yielded.load(Ordering::Relaxed),
            storage_probes: self.storage_probes.load(Ordering::Relaxed),
            probe_misses: self.probe_misses.load(Ordering::Relaxed),
            cells_evaluated: self.cells_evaluated.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_evictions: self.cache_evictions.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`GridMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GridMetricsSnapshot {
    pub chunks_yielded: u64,
    pub storage_probes: u64,
    pub probe_misses: u64,
    pub cells_evaluated: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
}

impl GridMetricsSnapshot {
    /// Compact JSON object, keys in declaration order
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(GridMetrics::new().snapshot(), GridMetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let metrics = GridMetrics::new();
        metrics.increment_chunks_yielded();
        metrics.increment_chunks_yielded();
        metrics.increment_storage_probes();
        metrics.increment_probe_misses();
        metrics.increment_cells_evaluated();
        metrics.increment_cache_hits();
        metrics.increment_cache_misses();
        metrics.increment_cache_evictions();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunks_yielded, 2);
        assert_eq!(snapshot.storage_probes, 1);
        assert_eq!(snapshot.probe_misses, 1);
        assert_eq!(snapshot.cells_evaluated, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_evictions, 1);
    }

    #[test]
    fn test_to_json() {
        let metrics = GridMetrics::new();
        metrics.increment_cache_hits();

        let parsed: serde_json::Value = serde_json::from_str(&metrics.snapshot().to_json()).unwrap();
        assert_eq!(parsed["cache_hits"], 1);
        assert_eq!(parsed["chunks_yielded"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(GridMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_cells_evaluated();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().cells_evaluated, 800);
    }
}
