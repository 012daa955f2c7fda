//! Coordinate ranges and chunk-position enumeration
//!
//! # Derived sets
//!
//! - Extended: low corners lowered to their chunk start. A chunk position
//!   lies in the extended set iff the chunk intersects the original set.
//! - Inner: ranges shrunk by one cell on boundary-sensitive dimensions. A
//!   chunk inside one inner range needs no per-cell predicate evaluation.
//!   A chunk covered only by the union of several inner ranges is still
//!   treated as a boundary chunk.

mod chunk_positions;
mod range;
mod range_set;

pub use chunk_positions::ChunkPositionCursor;
pub use range::Range;
pub use range_set::RangeSet;
