//! Sparse in-memory chunked array
//!
//! Only chunks holding at least one cell exist. Cells in a neighbour's
//! overlap region are replicated into that neighbour. Every cursor
//! shares the array's [`StorageCounters`], so tests can see exactly which
//! chunks a consumer fetched and how often it probed.
//!
//! A `set_position` miss leaves the chunk cursor invalid: `end()` reports
//! true and `position()` fails until the next successful `set_position`
//! or `restart`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::array::{
    Array, ArrayCursor, ArrayDesc, ArrayError, ArrayResult, AttributeId, CellCursor, Chunk,
    Coordinates, IterationMode, Value,
};

/// One stored chunk, all attributes
#[derive(Debug)]
pub(crate) struct ChunkData {
    pub(crate) position: Coordinates,
    pub(crate) first: Coordinates,
    pub(crate) last: Coordinates,
    pub(crate) first_overlap: Coordinates,
    pub(crate) last_overlap: Coordinates,
    /// Sorted by coordinates; includes overlap cells
    pub(crate) cells: Vec<(Coordinates, Vec<Value>)>,
}

impl ChunkData {
    fn in_home_box(&self, pos: &Coordinates) -> bool {
        pos.iter()
            .zip(self.first.iter().zip(&self.last))
            .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }

    fn find(&self, pos: &Coordinates) -> Option<usize> {
        self.cells.binary_search_by(|(p, _)| p.cmp(pos)).ok()
    }
}

/// Access counters shared by every cursor of one array
#[derive(Debug, Default)]
pub struct StorageCounters {
    chunk_fetches: AtomicU64,
    probes: AtomicU64,
    probe_misses: AtomicU64,
    fetched: Mutex<Vec<Coordinates>>,
}

impl StorageCounters {
    /// Number of `chunk()` calls
    pub fn chunk_fetches(&self) -> u64 {
        self.chunk_fetches.load(Ordering::Relaxed)
    }

    /// Number of chunk-level `set_position` calls
    pub fn probes(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of chunk-level `set_position` calls that found nothing
    pub fn probe_misses(&self) -> u64 {
        self.probe_misses.load(Ordering::Relaxed)
    }

    /// Positions of every fetched chunk, in fetch order
    pub fn fetched_positions(&self) -> Vec<Coordinates> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resets every counter to zero
    pub fn reset(&self) {
        self.chunk_fetches.store(0, Ordering::Relaxed);
        self.probes.store(0, Ordering::Relaxed);
        self.probe_misses.store(0, Ordering::Relaxed);
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record_fetch(&self, position: &Coordinates) {
        self.chunk_fetches.fetch_add(1, Ordering::Relaxed);
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(position.clone());
    }
}

/// Sparse chunked array held in memory
#[derive(Debug, Clone)]
pub struct MemArray {
    desc: Arc<ArrayDesc>,
    chunks: Arc<Vec<Arc<ChunkData>>>,
    counters: Arc<StorageCounters>,
}

impl MemArray {
    pub(crate) fn from_chunks(desc: ArrayDesc, chunks: Vec<Arc<ChunkData>>) -> Self {
        Self {
            desc: Arc::new(desc),
            chunks: Arc::new(chunks),
            counters: Arc::new(StorageCounters::default()),
        }
    }

    /// Access counters
    pub fn counters(&self) -> &StorageCounters {
        &self.counters
    }

    /// Positions of every stored chunk, ascending
    pub fn chunk_positions(&self) -> Vec<Coordinates> {
        self.chunks.iter().map(|c| c.position.clone()).collect()
    }

    /// Number of stored cells, overlap copies excluded
    pub fn cell_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| c.cells.iter().filter(|(p, _)| c.in_home_box(p)).count())
            .sum()
    }

    /// All attribute values of the cell at `pos`
    pub fn cell(&self, pos: &Coordinates) -> Option<&[Value]> {
        if !self.desc.contains(pos) {
            return None;
        }
        let mut chunk_pos = pos.clone();
        self.desc.chunk_position_for(&mut chunk_pos);
        let chunk = self.find_chunk(&chunk_pos)?;
        let index = chunk.find(pos)?;
        Some(&chunk.cells[index].1)
    }

    /// Every stored cell in row-major order
    pub fn cells(&self) -> Vec<(Coordinates, Vec<Value>)> {
        let mut cells: Vec<_> = self
            .chunks
            .iter()
            .flat_map(|c| c.cells.iter().filter(|(p, _)| c.in_home_box(p)).cloned())
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    fn find_chunk(&self, chunk_pos: &Coordinates) -> Option<&Arc<ChunkData>> {
        self.chunks
            .binary_search_by(|c| c.position.cmp(chunk_pos))
            .ok()
            .map(|i| &self.chunks[i])
    }
}

impl Array for MemArray {
    fn desc(&self) -> &ArrayDesc {
        &self.desc
    }

    fn cursor(&self, attribute: AttributeId) -> ArrayResult<Box<dyn ArrayCursor>> {
        if attribute >= self.desc.num_attributes() {
            return Err(ArrayError::invalid_attribute(
                attribute,
                self.desc.num_attributes(),
            ));
        }
        let mut cursor = MemArrayCursor {
            desc: Arc::clone(&self.desc),
            chunks: Arc::clone(&self.chunks),
            counters: Arc::clone(&self.counters),
            attribute,
            state: CursorState::End,
        };
        cursor.restart()?;
        Ok(Box::new(cursor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Positioned(usize),
    End,
    Invalid,
}

struct MemArrayCursor {
    desc: Arc<ArrayDesc>,
    chunks: Arc<Vec<Arc<ChunkData>>>,
    counters: Arc<StorageCounters>,
    attribute: AttributeId,
    state: CursorState,
}

impl ArrayCursor for MemArrayCursor {
    fn end(&self) -> bool {
        !matches!(self.state, CursorState::Positioned(_))
    }

    fn advance(&mut self) -> ArrayResult<()> {
        self.state = match self.state {
            CursorState::Positioned(i) if i + 1 < self.chunks.len() => CursorState::Positioned(i + 1),
            CursorState::Positioned(_) | CursorState::End => CursorState::End,
            CursorState::Invalid => {
                return Err(ArrayError::no_current_element(
                    "storage cursor lost its position after a failed probe",
                ))
            }
        };
        Ok(())
    }

    fn position(&self) -> ArrayResult<&Coordinates> {
        match self.state {
            CursorState::Positioned(i) => Ok(&self.chunks[i].position),
            _ => Err(ArrayError::no_current_element("storage chunk cursor")),
        }
    }

    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool> {
        self.counters.probes.fetch_add(1, Ordering::Relaxed);
        self.desc.check_dims(pos)?;

        let found = if self.desc.contains(pos) {
            let mut chunk_pos = pos.clone();
            self.desc.chunk_position_for(&mut chunk_pos);
            self.chunks
                .binary_search_by(|c| c.position.cmp(&chunk_pos))
                .ok()
        } else {
            None
        };

        match found {
            Some(i) => {
                self.state = CursorState::Positioned(i);
                Ok(true)
            }
            None => {
                self.counters.probe_misses.fetch_add(1, Ordering::Relaxed);
                self.state = CursorState::Invalid;
                Ok(false)
            }
        }
    }

    fn restart(&mut self) -> ArrayResult<()> {
        self.state = if self.chunks.is_empty() {
            CursorState::End
        } else {
            CursorState::Positioned(0)
        };
        Ok(())
    }

    fn chunk(&self) -> ArrayResult<Arc<dyn Chunk>> {
        let CursorState::Positioned(i) = self.state else {
            return Err(ArrayError::no_current_element("storage chunk cursor"));
        };
        let data = Arc::clone(&self.chunks[i]);
        self.counters.record_fetch(&data.position);
        Ok(Arc::new(MemChunk {
            data,
            desc: Arc::clone(&self.desc),
            attribute: self.attribute,
        }))
    }
}

struct MemChunk {
    data: Arc<ChunkData>,
    desc: Arc<ArrayDesc>,
    attribute: AttributeId,
}

impl Chunk for MemChunk {
    fn attribute_id(&self) -> AttributeId {
        self.attribute
    }

    fn first_position(&self, with_overlap: bool) -> Coordinates {
        if with_overlap {
            self.data.first_overlap.clone()
        } else {
            self.data.first.clone()
        }
    }

    fn last_position(&self, with_overlap: bool) -> Coordinates {
        if with_overlap {
            self.data.last_overlap.clone()
        } else {
            self.data.last.clone()
        }
    }

    fn cell_cursor(&self, mode: IterationMode) -> ArrayResult<Box<dyn CellCursor>> {
        let attr = &self.desc.attributes[self.attribute];
        let mut cursor = MemCellCursor {
            data: Arc::clone(&self.data),
            attribute: self.attribute,
            indicator: self.desc.empty_bitmap_attribute().map(|a| a.id),
            default: attr.value_type.default_value(),
            mode,
            index: 0,
        };
        cursor.restart()?;
        Ok(Box::new(cursor))
    }
}

struct MemCellCursor {
    data: Arc<ChunkData>,
    attribute: AttributeId,
    indicator: Option<AttributeId>,
    default: Value,
    mode: IterationMode,
    index: usize,
}

impl MemCellCursor {
    fn is_empty_at(&self, index: usize) -> bool {
        self.indicator
            .map_or(false, |k| !self.data.cells[index].1[k].as_bool())
    }

    fn accepts(&self, index: usize) -> bool {
        let (pos, values) = &self.data.cells[index];
        if self.mode.contains(IterationMode::IGNORE_OVERLAPS) && !self.data.in_home_box(pos) {
            return false;
        }
        if self.mode.contains(IterationMode::IGNORE_EMPTY_CELLS) && self.is_empty_at(index) {
            return false;
        }
        if self.mode.contains(IterationMode::IGNORE_DEFAULT_VALUES) {
            let value = &values[self.attribute];
            if value.is_null() || *value == self.default {
                return false;
            }
        }
        true
    }

    fn seek_from(&mut self, start: usize) {
        self.index = (start..self.data.cells.len())
            .find(|&i| self.accepts(i))
            .unwrap_or(self.data.cells.len());
    }

    fn current(&self) -> ArrayResult<&(Coordinates, Vec<Value>)> {
        self.data
            .cells
            .get(self.index)
            .ok_or_else(|| ArrayError::no_current_element("storage cell cursor"))
    }
}

impl CellCursor for MemCellCursor {
    fn end(&self) -> bool {
        self.index >= self.data.cells.len()
    }

    fn advance(&mut self) -> ArrayResult<()> {
        if self.end() {
            return Err(ArrayError::no_current_element("storage cell cursor"));
        }
        self.seek_from(self.index + 1);
        Ok(())
    }

    fn position(&self) -> ArrayResult<&Coordinates> {
        Ok(&self.current()?.0)
    }

    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool> {
        match self.data.find(pos) {
            Some(i) if self.accepts(i) => {
                self.index = i;
                Ok(true)
            }
            _ => {
                self.index = self.data.cells.len();
                Ok(false)
            }
        }
    }

    fn restart(&mut self) -> ArrayResult<()> {
        self.seek_from(0);
        Ok(())
    }

    fn item(&mut self) -> ArrayResult<Value> {
        Ok(self.current()?.1[self.attribute].clone())
    }

    fn is_empty(&mut self) -> ArrayResult<bool> {
        self.current()?;
        Ok(self.is_empty_at(self.index))
    }
}
