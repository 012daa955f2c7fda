//! The chunked-array access contract
//!
//! Storage engines implement these traits; the between array consumes
//! them and implements them again, so a filtered array can be the input
//! of another operator.
//!
//! Cursors follow one protocol at both granularities:
//! `restart`, `advance`, `end`, `position`, `set_position`.
//! A `set_position` that finds nothing returns `Ok(false)`; reading a
//! cursor that has no current element returns `AERO_NO_CURRENT_ELEMENT`.

use std::ops::BitOr;
use std::sync::Arc;

use super::desc::ArrayDesc;
use super::errors::ArrayResult;
use super::value::Value;
use super::{AttributeId, Coordinates};

/// Cell iteration flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterationMode(u32);

impl IterationMode {
    /// No flags
    pub const NONE: IterationMode = IterationMode(0);
    /// Expose only visible (non-empty) cells
    pub const IGNORE_EMPTY_CELLS: IterationMode = IterationMode(1);
    /// Skip cells in the overlap region
    pub const IGNORE_OVERLAPS: IterationMode = IterationMode(2);
    /// Skip cells holding the attribute's default value
    pub const IGNORE_DEFAULT_VALUES: IterationMode = IterationMode(4);

    /// This mode with the flags of `other` set
    pub const fn with(self, other: IterationMode) -> IterationMode {
        IterationMode(self.0 | other.0)
    }

    /// Whether every flag in `other` is set
    pub fn contains(self, other: IterationMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// This mode with the flags of `other` cleared
    pub fn without(self, other: IterationMode) -> IterationMode {
        IterationMode(self.0 & !other.0)
    }
}

impl BitOr for IterationMode {
    type Output = IterationMode;

    fn bitor(self, rhs: IterationMode) -> IterationMode {
        self.with(rhs)
    }
}

/// An array that hands out one chunk cursor per attribute
pub trait Array: Send + Sync {
    /// Schema of this array
    fn desc(&self) -> &ArrayDesc;

    /// New chunk-level cursor over `attribute`, restarted at the first chunk
    fn cursor(&self, attribute: AttributeId) -> ArrayResult<Box<dyn ArrayCursor>>;
}

/// Chunk-level cursor over one attribute
pub trait ArrayCursor: Send {
    /// True once the cursor has moved past the last chunk
    fn end(&self) -> bool;

    /// Moves to the next chunk in grid order
    fn advance(&mut self) -> ArrayResult<()>;

    /// Position of the current chunk
    fn position(&self) -> ArrayResult<&Coordinates>;

    /// Moves to the chunk containing `pos`; `Ok(false)` if there is none.
    ///
    /// After a `false` the cursor state is unspecified until the next
    /// successful `set_position` or `restart`.
    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool>;

    /// Moves back to the first chunk
    fn restart(&mut self) -> ArrayResult<()>;

    /// Handle to the current chunk
    fn chunk(&self) -> ArrayResult<Arc<dyn Chunk>>;
}

/// One chunk of one attribute
pub trait Chunk: Send + Sync {
    /// Attribute this chunk belongs to
    fn attribute_id(&self) -> AttributeId;

    /// First cell coordinate of the chunk
    fn first_position(&self, with_overlap: bool) -> Coordinates;

    /// Last cell coordinate of the chunk
    fn last_position(&self, with_overlap: bool) -> Coordinates;

    /// New cell-level cursor, restarted at the first cell
    fn cell_cursor(&self, mode: IterationMode) -> ArrayResult<Box<dyn CellCursor>>;
}

/// Cell-level cursor inside one chunk
pub trait CellCursor: Send {
    /// True once the cursor has moved past the last cell
    fn end(&self) -> bool;

    /// Moves to the next cell in row-major order
    fn advance(&mut self) -> ArrayResult<()>;

    /// Coordinates of the current cell
    fn position(&self) -> ArrayResult<&Coordinates>;

    /// Moves to the cell at `pos`; `Ok(false)` if there is none
    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool>;

    /// Moves back to the first cell
    fn restart(&mut self) -> ArrayResult<()>;

    /// Value of the current cell
    fn item(&mut self) -> ArrayResult<Value>;

    /// Whether the current cell is empty
    fn is_empty(&mut self) -> ArrayResult<bool>;
}
