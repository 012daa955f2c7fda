//! Array model for aerogrid
//!
//! Coordinates, values, schemas, and the cursor contract shared by
//! storage engines and the between array.
//!
//! # Coordinates
//!
//! One `i64` per dimension. `Vec` ordering is lexicographic, which is
//! the row-major grid order every cursor in this crate follows.

mod desc;
mod errors;
mod traits;
mod value;

pub use desc::{ArrayDesc, AttributeDesc, DimensionDesc, EMPTY_TAG_NAME};
pub use errors::{ArrayError, ArrayErrorCode, ArrayResult, Severity};
pub use traits::{Array, ArrayCursor, CellCursor, Chunk, IterationMode};
pub use value::{Value, ValueType};

/// A single coordinate value
pub type Coordinate = i64;

/// A point in the array grid, one coordinate per dimension
pub type Coordinates = Vec<Coordinate>;

/// Index of an attribute in an array schema
pub type AttributeId = usize;
