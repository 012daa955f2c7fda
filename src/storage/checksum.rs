//! CRC32 checksums over chunk content
//!
//! Uses CRC32 (IEEE polynomial). Cells are encoded as coordinates
//! followed by the value's stable byte encoding.

use crc32fast::Hasher;

use crate::array::{Coordinates, Value};

/// Computes a CRC32 checksum over the provided data.
///
/// This function is deterministic: the same input always produces the same output.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Checksum over a sequence of cells
pub fn cells_checksum(cells: &[(Coordinates, Value)]) -> u32 {
    let mut buf = Vec::with_capacity(cells.len() * 24);
    for (pos, value) in cells {
        buf.extend_from_slice(&(pos.len() as u32).to_le_bytes());
        for c in pos {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        value.encode_into(&mut buf);
    }
    compute_checksum(&buf)
}
