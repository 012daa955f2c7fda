//! Range-filtered iteration over a chunked array
//!
//! # Layers
//!
//! - [`BetweenArray`]: the filtered view, an [`Array`](crate::array::Array)
//!   over an input array
//! - [`GridCursor`]: merges the input's existing chunks with the chunk
//!   positions the ranges touch; chunks outside the ranges are never
//!   fetched
//! - [`BetweenChunk`]: classifies each chunk as fully inside, boundary or
//!   fully outside
//! - [`FilterCellCursor`]: evaluates the predicate on boundary chunks
//! - [`MaterializedChunkCache`]: shared cache for all-true existence
//!   chunks
//!
//! Cursors are single-threaded. Several cursors over one array may run
//! on different threads; the cache is the only shared mutable state.

mod array;
mod cache;
mod cell_cursor;
mod chunk;
mod grid_cursor;

pub use array::BetweenArray;
pub use cache::MaterializedChunkCache;
pub use cell_cursor::{BitmapVariant, FilterCellCursor};
pub use chunk::{BetweenChunk, ChunkClass};
pub use grid_cursor::GridCursor;
