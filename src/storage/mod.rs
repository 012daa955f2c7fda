//! Reference storage for aerogrid
//!
//! The between array treats storage as a black box behind the
//! [`Array`](crate::array::Array) traits. This module provides:
//! - `MemArray`: a sparse in-memory chunked array with access counters
//! - `MemArrayBuilder` and a JSON loader
//! - `MaterializedChunk`: an eagerly computed chunk with a CRC32 checksum

mod builder;
mod checksum;
mod loader;
mod materialized;
mod memory;

pub use builder::MemArrayBuilder;
pub use checksum::{cells_checksum, compute_checksum};
pub use loader::{load_array, parse_array, ArrayFile, CellRecord, LoadError};
pub use materialized::MaterializedChunk;
pub use memory::{MemArray, StorageCounters};
