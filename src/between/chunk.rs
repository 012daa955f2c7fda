//! Chunks of the filtered array
//!
//! Each chunk is classified once, from its bounding box including
//! overlaps:
//! - fully inside: the box lies in one inner range (or one range when
//!   there is no inner set); no cell needs the predicate
//! - fully outside: the box meets no range
//! - boundary: everything else
//!
//! The fully-inside test is conservative: a box covered by several
//! ranges together but by none alone is treated as boundary.

use std::sync::Arc;

use crate::array::{ArrayResult, AttributeId, CellCursor, Chunk, Coordinates, IterationMode};
use crate::ranges::Range;

use super::array::BetweenInner;
use super::cell_cursor::{BitmapVariant, FilterCellCursor};

/// Relation of a chunk to the query ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkClass {
    FullyInside,
    Boundary,
    FullyOutside,
}

impl ChunkClass {
    /// Classifies the box `first..=last`
    pub(crate) fn of(array: &BetweenInner, first: Coordinates, last: Coordinates) -> ChunkClass {
        let bounds = Range::new(first, last);
        let inside_set = array.inner.as_ref().unwrap_or(&array.ranges);
        if inside_set.find_one_that_contains_range(&bounds, &mut 0) {
            return ChunkClass::FullyInside;
        }
        if !array.ranges.find_one_that_intersects(&bounds, &mut 0) {
            return ChunkClass::FullyOutside;
        }
        ChunkClass::Boundary
    }
}

/// One chunk of a `BetweenArray` attribute
pub struct BetweenChunk {
    array: Arc<BetweenInner>,
    attribute: AttributeId,
    input: Arc<dyn Chunk>,
    /// Per predicate binding; set where the binding reads an attribute
    /// other than the one `input` holds
    companions: Vec<Option<(AttributeId, Arc<dyn Chunk>)>>,
    class: ChunkClass,
}

impl BetweenChunk {
    pub(crate) fn new(
        array: Arc<BetweenInner>,
        attribute: AttributeId,
        input: Arc<dyn Chunk>,
        companions: Vec<Option<(AttributeId, Arc<dyn Chunk>)>>,
    ) -> Self {
        let class = ChunkClass::of(
            &array,
            input.first_position(true),
            input.last_position(true),
        );
        Self {
            array,
            attribute,
            input,
            companions,
            class,
        }
    }

    pub fn class(&self) -> ChunkClass {
        self.class
    }

    fn variant(&self) -> Option<BitmapVariant> {
        let fully_inside = self.class == ChunkClass::FullyInside;
        if self.array.is_existence(self.attribute) {
            if self.array.is_synthetic(self.attribute) {
                Some(if fully_inside {
                    BitmapVariant::Empty
                } else {
                    BitmapVariant::New
                })
            } else if fully_inside {
                None
            } else {
                Some(BitmapVariant::Existing)
            }
        } else if fully_inside {
            None
        } else {
            Some(BitmapVariant::Plain)
        }
    }
}

impl Chunk for BetweenChunk {
    fn attribute_id(&self) -> AttributeId {
        self.attribute
    }

    fn first_position(&self, with_overlap: bool) -> Coordinates {
        self.input.first_position(with_overlap)
    }

    fn last_position(&self, with_overlap: bool) -> Coordinates {
        self.input.last_position(with_overlap)
    }

    /// Fully-inside chunks of stored attributes return the input cursor
    /// itself; every other case filters.
    fn cell_cursor(&self, mode: IterationMode) -> ArrayResult<Box<dyn CellCursor>> {
        let mode = if self.array.is_existence(self.attribute) {
            mode.without(IterationMode::IGNORE_DEFAULT_VALUES)
        } else {
            mode
        };
        match self.variant() {
            None => self.input.cell_cursor(mode),
            Some(variant) => Ok(Box::new(FilterCellCursor::open(
                Arc::clone(&self.array),
                variant,
                self.input.as_ref(),
                &self.companions,
                mode,
            )?)),
        }
    }
}
