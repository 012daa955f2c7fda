//! The filtered array
//!
//! `BetweenArray` wraps an input array, a set of coordinate ranges and an
//! optional predicate. It implements the same [`Array`] contract it
//! consumes, so it can feed any consumer of the input, including another
//! `BetweenArray`.

use std::sync::Arc;

use uuid::Uuid;

use crate::array::{
    Array, ArrayCursor, ArrayDesc, ArrayError, ArrayResult, AttributeId, Chunk, IterationMode,
};
use crate::config::GridConfig;
use crate::expr::Predicate;
use crate::observability::{log_event, Event, GridMetrics, GridMetricsSnapshot};
use crate::ranges::RangeSet;
use crate::storage::MaterializedChunk;

use super::cache::MaterializedChunkCache;
use super::chunk::{BetweenChunk, ChunkClass};
use super::grid_cursor::GridCursor;

/// State shared by the array and every cursor and chunk created from it
pub(crate) struct BetweenInner {
    pub(crate) input: Arc<dyn Array>,
    /// Input schema plus the existence attribute
    pub(crate) desc: ArrayDesc,
    pub(crate) ranges: RangeSet,
    pub(crate) extended: RangeSet,
    pub(crate) inner: Option<RangeSet>,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) cache: MaterializedChunkCache,
    pub(crate) metrics: GridMetrics,
    pub(crate) query_id: Uuid,
    pub(crate) query_tag: String,
}

impl BetweenInner {
    /// Attributes the input does not store; only the appended
    /// existence attribute can be synthetic
    pub(crate) fn is_synthetic(&self, attribute: AttributeId) -> bool {
        attribute >= self.input.desc().num_attributes()
    }

    pub(crate) fn is_existence(&self, attribute: AttributeId) -> bool {
        self.desc
            .empty_bitmap_attribute()
            .map_or(false, |a| a.id == attribute)
    }

    /// Input attribute whose chunks drive iteration of `attribute`
    pub(crate) fn input_attribute(&self, attribute: AttributeId) -> AttributeId {
        if self.is_synthetic(attribute) {
            self.predicate
                .as_ref()
                .and_then(Predicate::first_bound_attribute)
                .unwrap_or(0)
        } else {
            attribute
        }
    }

    /// Builds the chunk at the cursor's current position
    pub(crate) fn create_chunk(this: &Arc<Self>, cursor: &GridCursor) -> ArrayResult<Arc<dyn Chunk>> {
        let attribute = cursor.attribute();
        let input = cursor.input_chunk()?;
        let companions = cursor.companion_chunks()?;
        let chunk = BetweenChunk::new(Arc::clone(this), attribute, input, companions);

        let cached = chunk.class() == ChunkClass::FullyInside
            && this.is_synthetic(attribute)
            && this.cache.capacity() > 0;
        if !cached {
            return Ok(Arc::new(chunk));
        }

        let position = cursor.position()?.clone();
        let materialized = this.cache.get(&position, &this.metrics, || {
            MaterializedChunk::materialize(&chunk, IterationMode::IGNORE_EMPTY_CELLS)
        })?;
        if materialized.first_position(false) != chunk.first_position(false) {
            log_event(
                Event::CacheChunkMismatch,
                &[
                    ("cached_first", format!("{:?}", materialized.first_position(false)).as_str()),
                    ("position", format!("{:?}", position).as_str()),
                    ("query_id", this.query_tag.as_str()),
                ],
            );
            return Err(ArrayError::operation_failed(
                "cached chunk does not match requested chunk",
                &position,
            ));
        }
        let materialized: Arc<dyn Chunk> = materialized;
        Ok(materialized)
    }
}

/// A range- and predicate-filtered view of an input array
#[derive(Clone)]
pub struct BetweenArray {
    inner: Arc<BetweenInner>,
}

impl BetweenArray {
    /// Creates the view with the cache capacity from [`GridConfig::global`]
    ///
    /// `inner` ranges, when given, mark regions known to satisfy the
    /// predicate; chunks inside them are passed through unfiltered.
    pub fn new(
        input: Arc<dyn Array>,
        ranges: RangeSet,
        inner: Option<RangeSet>,
        predicate: Option<Predicate>,
    ) -> ArrayResult<Self> {
        let capacity = GridConfig::global().result_prefetch_queue_size;
        Self::with_cache_capacity(input, ranges, inner, predicate, capacity)
    }

    /// Creates the view with an explicit cache capacity
    pub fn with_cache_capacity(
        input: Arc<dyn Array>,
        mut ranges: RangeSet,
        inner: Option<RangeSet>,
        predicate: Option<Predicate>,
        cache_capacity: usize,
    ) -> ArrayResult<Self> {
        let input_desc = input.desc();
        if ranges.num_dims() != input_desc.num_dims() {
            return Err(ArrayError::dimension_mismatch(
                input_desc.num_dims(),
                ranges.num_dims(),
            ));
        }
        if let Some(set) = &inner {
            if set.num_dims() != input_desc.num_dims() {
                return Err(ArrayError::dimension_mismatch(
                    input_desc.num_dims(),
                    set.num_dims(),
                ));
            }
        }
        if let Some(predicate) = &predicate {
            predicate
                .validate_against(input_desc)
                .map_err(|e| ArrayError::invalid_schema(e.to_string()))?;
        }

        ranges.build_index();
        let inner = inner.map(|mut set| {
            set.build_index();
            set
        });
        let desc = input_desc.with_empty_tag();
        let extended = ranges.extended(&desc)?;
        let query_id = Uuid::new_v4();

        let array = Self {
            inner: Arc::new(BetweenInner {
                input,
                desc,
                ranges,
                extended,
                inner,
                predicate,
                cache: MaterializedChunkCache::new(cache_capacity),
                metrics: GridMetrics::new(),
                query_id,
                query_tag: query_id.to_string(),
            }),
        };

        log_event(
            Event::BetweenArrayCreated,
            &[
                ("array", array.inner.desc.name.as_str()),
                ("cache_capacity", cache_capacity.to_string().as_str()),
                ("query_id", array.inner.query_tag.as_str()),
                ("ranges", array.inner.ranges.len().to_string().as_str()),
            ],
        );
        Ok(array)
    }

    /// Cursor over the chunks of `attribute` that exist and intersect the
    /// ranges
    pub fn create_array_iterator(&self, attribute: AttributeId) -> ArrayResult<GridCursor> {
        GridCursor::new(Arc::clone(&self.inner), attribute)
    }

    /// The chunk of `attribute` at the cursor's position
    pub fn create_chunk(
        &self,
        cursor: &GridCursor,
        attribute: AttributeId,
    ) -> ArrayResult<Arc<dyn Chunk>> {
        if attribute != cursor.attribute() {
            return Err(ArrayError::invalid_attribute(
                attribute,
                self.inner.desc.num_attributes(),
            ));
        }
        BetweenInner::create_chunk(&self.inner, cursor)
    }

    /// The unfiltered input
    pub fn input(&self) -> &Arc<dyn Array> {
        &self.inner.input
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.inner.ranges
    }

    /// Ranges with low bounds lowered to chunk starts
    pub fn extended_ranges(&self) -> &RangeSet {
        &self.inner.extended
    }

    pub fn inner_ranges(&self) -> Option<&RangeSet> {
        self.inner.inner.as_ref()
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.inner.predicate.as_ref()
    }

    pub fn cache(&self) -> &MaterializedChunkCache {
        &self.inner.cache
    }

    pub fn metrics(&self) -> GridMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Identifier included in every log line about this array
    pub fn query_id(&self) -> Uuid {
        self.inner.query_id
    }
}

impl Array for BetweenArray {
    fn desc(&self) -> &ArrayDesc {
        &self.inner.desc
    }

    fn cursor(&self, attribute: AttributeId) -> ArrayResult<Box<dyn ArrayCursor>> {
        Ok(Box::new(self.create_array_iterator(attribute)?))
    }
}
