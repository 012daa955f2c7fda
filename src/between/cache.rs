//! Materialized chunk cache
//!
//! Bounded map from chunk position to a fully computed chunk. Entries
//! are evicted oldest first. The mutex is held for lookups and inserts
//! only, never while a chunk is being materialized, so two cursors that
//! miss on the same position may both compute it. The first insert wins
//! and both callers receive that entry.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::array::{ArrayResult, Coordinates};
use crate::observability::{log_event, Event, GridMetrics, Logger, Severity};
use crate::storage::MaterializedChunk;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Coordinates, Arc<MaterializedChunk>>,
    /// Insertion order, oldest first
    order: VecDeque<Coordinates>,
}

/// Thread-safe FIFO cache of materialized chunks
#[derive(Debug)]
pub struct MaterializedChunkCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl MaterializedChunkCache {
    /// Creates a cache holding at most `capacity` chunks; 0 disables it
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, position: &Coordinates) -> bool {
        self.lock().entries.contains_key(position)
    }

    /// Returns the chunk cached at `position`, computing it with
    /// `materialize` on a miss.
    ///
    /// A failed materialization caches nothing.
    pub fn get<F>(
        &self,
        position: &Coordinates,
        metrics: &GridMetrics,
        materialize: F,
    ) -> ArrayResult<Arc<MaterializedChunk>>
    where
        F: FnOnce() -> ArrayResult<MaterializedChunk>,
    {
        if let Some(hit) = self.lock().entries.get(position) {
            metrics.increment_cache_hits();
            return Ok(Arc::clone(hit));
        }
        metrics.increment_cache_misses();

        let computed = Arc::new(materialize()?);
        if self.capacity == 0 {
            return Ok(computed);
        }

        let mut state = self.lock();
        if let Some(existing) = state.entries.get(position) {
            return Ok(Arc::clone(existing));
        }
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            metrics.increment_cache_evictions();
            if Logger::enabled(Severity::Trace) {
                log_event(Event::CacheEviction, &[("position", format!("{:?}", oldest).as_str())]);
            }
        }
        state.order.push_back(position.clone());
        state.entries.insert(position.clone(), Arc::clone(&computed));
        Ok(computed)
    }

    /// Drops every entry
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Array, ArrayDesc, AttributeDesc, DimensionDesc, IterationMode, Value, ValueType};
    use crate::storage::MemArrayBuilder;

    fn materialized(x: i64) -> MaterializedChunk {
        let desc = ArrayDesc::new(
            "c",
            vec![DimensionDesc::new("x", 0, 99, 10)],
            vec![AttributeDesc::new(0, "v", ValueType::Int64)],
        )
        .unwrap();
        let array = MemArrayBuilder::new(desc)
            .unwrap()
            .cell(vec![x], vec![Value::Int64(x)])
            .unwrap()
            .build();
        let chunk = array.cursor(0).unwrap().chunk().unwrap();
        MaterializedChunk::materialize(chunk.as_ref(), IterationMode::NONE).unwrap()
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = MaterializedChunkCache::new(2);
        let metrics = GridMetrics::new();
        let pos = vec![0];

        let first = cache.get(&pos, &metrics, || Ok(materialized(3))).unwrap();
        let second = cache
            .get(&pos, &metrics, || panic!("must be served from the cache"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = MaterializedChunkCache::new(2);
        let metrics = GridMetrics::new();
        for x in [0, 10, 20] {
            cache.get(&vec![x], &metrics, || Ok(materialized(x))).unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&vec![0]));
        assert!(cache.contains(&vec![10]));
        assert!(cache.contains(&vec![20]));
        assert_eq!(metrics.snapshot().cache_evictions, 1);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = MaterializedChunkCache::new(0);
        let metrics = GridMetrics::new();
        cache.get(&vec![0], &metrics, || Ok(materialized(1))).unwrap();
        cache.get(&vec![0], &metrics, || Ok(materialized(1))).unwrap();

        assert!(cache.is_empty());
        assert_eq!(metrics.snapshot().cache_misses, 2);
        assert_eq!(metrics.snapshot().cache_hits, 0);
    }

    #[test]
    fn test_failed_materialization_not_cached() {
        let cache = MaterializedChunkCache::new(2);
        let metrics = GridMetrics::new();
        let result = cache.get(&vec![0], &metrics, || {
            Err(crate::array::ArrayError::no_current_element("test"))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = MaterializedChunkCache::new(2);
        let metrics = GridMetrics::new();
        cache.get(&vec![0], &metrics, || Ok(materialized(1))).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
