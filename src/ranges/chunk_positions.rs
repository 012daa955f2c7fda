//! Enumeration of chunk positions that intersect a range set
//!
//! Each range covers a box of the chunk lattice (chunk-aligned corners,
//! one chunk interval per step). The cursor is the ordered union of those
//! boxes. The next candidate at or after a point is computed per box in
//! O(dims) and the smallest wins, so gaps between ranges are jumped over
//! instead of walked.

use crate::array::{ArrayDesc, ArrayError, ArrayResult, Coordinate, Coordinates};

use super::range_set::{clip_to_array, RangeSet};

/// Chunk-aligned box, both corners inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
struct GridBox {
    low: Coordinates,
    high: Coordinates,
}

impl GridBox {
    fn on_lattice(&self, dim: usize, value: Coordinate, step: Coordinate) -> bool {
        value >= self.low[dim] && value <= self.high[dim] && (value - self.low[dim]) % step == 0
    }

    /// Smallest lattice value on `dim` that is >= `value`
    fn ceil_on_lattice(&self, dim: usize, value: Coordinate, step: Coordinate) -> Option<Coordinate> {
        let low = self.low[dim];
        if value > self.high[dim] {
            return None;
        }
        let candidate = if value <= low {
            low
        } else {
            low + (value - low + step - 1) / step * step
        };
        (candidate <= self.high[dim]).then_some(candidate)
    }

    /// Smallest lattice point `q` in the box with `q >= from`
    /// (`q > from` when `strict`), in row-major order.
    fn next_from(&self, from: &Coordinates, strict: bool, steps: &[Coordinate]) -> Option<Coordinates> {
        let n = from.len();
        if n == 0 {
            return None;
        }

        // Longest prefix of `from` that already sits on the lattice
        let valid = (0..n)
            .find(|&i| !self.on_lattice(i, from[i], steps[i]))
            .unwrap_or(n);
        if valid == n && !strict {
            return Some(from.clone());
        }

        let start = if valid == n { n - 1 } else { valid };
        for dim in (0..=start).rev() {
            let target = if dim < valid { from[dim].saturating_add(1) } else { from[dim] };
            if let Some(value) = self.ceil_on_lattice(dim, target, steps[dim]) {
                let mut next = Vec::with_capacity(n);
                next.extend_from_slice(&from[..dim]);
                next.push(value);
                next.extend_from_slice(&self.low[dim + 1..]);
                return Some(next);
            }
        }
        None
    }
}

/// Cursor over the chunk positions intersecting a range set, ascending
#[derive(Debug, Clone)]
pub struct ChunkPositionCursor {
    boxes: Vec<GridBox>,
    steps: Vec<Coordinate>,
    current: Option<Coordinates>,
}

impl ChunkPositionCursor {
    /// Creates a cursor positioned at the first candidate
    pub fn new(ranges: &RangeSet, desc: &ArrayDesc) -> ArrayResult<Self> {
        if ranges.num_dims() != desc.num_dims() {
            return Err(ArrayError::dimension_mismatch(desc.num_dims(), ranges.num_dims()));
        }

        let boxes = ranges
            .ranges()
            .iter()
            .filter_map(|r| clip_to_array(r, desc))
            .map(|r| {
                let mut low = r.low;
                let mut high = r.high;
                desc.chunk_position_for(&mut low);
                desc.chunk_position_for(&mut high);
                GridBox { low, high }
            })
            .collect();

        let mut cursor = Self {
            boxes,
            steps: desc.dimensions.iter().map(|d| d.chunk_interval).collect(),
            current: None,
        };
        cursor.restart();
        Ok(cursor)
    }

    /// Moves to the first candidate, or to the exhausted state
    pub fn restart(&mut self) {
        self.current = self.boxes.iter().map(|b| b.low.clone()).min();
    }

    /// True once every candidate has been passed
    pub fn end(&self) -> bool {
        self.current.is_none()
    }

    /// Current candidate
    pub fn position(&self) -> ArrayResult<&Coordinates> {
        self.current
            .as_ref()
            .ok_or_else(|| ArrayError::no_current_element("chunk position cursor is exhausted"))
    }

    /// Moves forward to the first candidate >= `pos`.
    ///
    /// Never moves backwards. Returns whether the cursor moved; it may
    /// have moved to the exhausted state.
    pub fn advance_position_to_at_least(&mut self, pos: &Coordinates) -> bool {
        match &self.current {
            None => false,
            Some(current) if current >= pos => false,
            Some(_) => {
                self.current = self.next_candidate(pos, false);
                true
            }
        }
    }

    /// Moves to the next candidate strictly after the current one
    pub fn advance(&mut self) {
        if let Some(current) = self.current.take() {
            self.current = self.next_candidate(&current, true);
        }
    }

    fn next_candidate(&self, from: &Coordinates, strict: bool) -> Option<Coordinates> {
        self.boxes
            .iter()
            .filter_map(|b| b.next_from(from, strict, &self.steps))
            .min()
    }
}
