//! Fully computed chunks
//!
//! A materialized chunk holds every cell a chunk cursor produced, so the
//! work behind it (predicate evaluation, bitmap synthesis) happens once.
//! Its content is fixed at construction and covered by a CRC32 checksum.

use std::sync::Arc;

use crate::array::{
    ArrayError, ArrayResult, AttributeId, CellCursor, Chunk, Coordinates, IterationMode, Value,
};

use super::checksum::cells_checksum;

/// Immutable copy of one chunk's visible cells
#[derive(Debug, Clone)]
pub struct MaterializedChunk {
    attribute: AttributeId,
    first: Coordinates,
    last: Coordinates,
    first_overlap: Coordinates,
    last_overlap: Coordinates,
    cells: Arc<Vec<(Coordinates, Value)>>,
    checksum: u32,
}

impl MaterializedChunk {
    /// Drains a cell cursor of `chunk` opened with `mode`
    pub fn materialize(chunk: &dyn Chunk, mode: IterationMode) -> ArrayResult<Self> {
        let mut cursor = chunk.cell_cursor(mode)?;
        let mut cells = Vec::new();
        while !cursor.end() {
            let pos = cursor.position()?.clone();
            cells.push((pos, cursor.item()?));
            cursor.advance()?;
        }
        let checksum = cells_checksum(&cells);
        Ok(Self {
            attribute: chunk.attribute_id(),
            first: chunk.first_position(false),
            last: chunk.last_position(false),
            first_overlap: chunk.first_position(true),
            last_overlap: chunk.last_position(true),
            cells: Arc::new(cells),
            checksum,
        })
    }

    /// Materialized cells in row-major order
    pub fn cells(&self) -> &[(Coordinates, Value)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Checksum computed at construction
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Recomputes the checksum and compares
    pub fn verify(&self) -> bool {
        cells_checksum(&self.cells) == self.checksum
    }
}

impl Chunk for MaterializedChunk {
    fn attribute_id(&self) -> AttributeId {
        self.attribute
    }

    fn first_position(&self, with_overlap: bool) -> Coordinates {
        if with_overlap {
            self.first_overlap.clone()
        } else {
            self.first.clone()
        }
    }

    fn last_position(&self, with_overlap: bool) -> Coordinates {
        if with_overlap {
            self.last_overlap.clone()
        } else {
            self.last.clone()
        }
    }

    /// Iterates the stored cells. Only `IGNORE_OVERLAPS` is honoured;
    /// every other flag was applied at materialization.
    fn cell_cursor(&self, mode: IterationMode) -> ArrayResult<Box<dyn CellCursor>> {
        let cells = if mode.contains(IterationMode::IGNORE_OVERLAPS) {
            let home: Vec<_> = self
                .cells
                .iter()
                .filter(|(pos, _)| {
                    pos.iter()
                        .zip(self.first.iter().zip(&self.last))
                        .all(|(c, (lo, hi))| lo <= c && c <= hi)
                })
                .cloned()
                .collect();
            Arc::new(home)
        } else {
            Arc::clone(&self.cells)
        };
        Ok(Box::new(MaterializedCellCursor { cells, index: 0 }))
    }
}

struct MaterializedCellCursor {
    cells: Arc<Vec<(Coordinates, Value)>>,
    index: usize,
}

impl MaterializedCellCursor {
    fn current(&self) -> ArrayResult<&(Coordinates, Value)> {
        self.cells
            .get(self.index)
            .ok_or_else(|| ArrayError::no_current_element("materialized cell cursor"))
    }
}

impl CellCursor for MaterializedCellCursor {
    fn end(&self) -> bool {
        self.index >= self.cells.len()
    }

    fn advance(&mut self) -> ArrayResult<()> {
        self.current()?;
        self.index += 1;
        Ok(())
    }

    fn position(&self) -> ArrayResult<&Coordinates> {
        Ok(&self.current()?.0)
    }

    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool> {
        match self.cells.binary_search_by(|(p, _)| p.cmp(pos)) {
            Ok(i) => {
                self.index = i;
                Ok(true)
            }
            Err(_) => {
                self.index = self.cells.len();
                Ok(false)
            }
        }
    }

    fn restart(&mut self) -> ArrayResult<()> {
        self.index = 0;
        Ok(())
    }

    fn item(&mut self) -> ArrayResult<Value> {
        Ok(self.current()?.1.clone())
    }

    fn is_empty(&mut self) -> ArrayResult<bool> {
        self.current()?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Array, ArrayDesc, AttributeDesc, DimensionDesc, ValueType};
    use crate::storage::MemArrayBuilder;

    fn chunk() -> Arc<dyn Chunk> {
        let desc = ArrayDesc::new(
            "m",
            vec![DimensionDesc::new("x", 0, 9, 10)],
            vec![AttributeDesc::new(0, "v", ValueType::Int64)],
        )
        .unwrap();
        let array = MemArrayBuilder::new(desc)
            .unwrap()
            .cell(vec![2], vec![Value::Int64(20)])
            .unwrap()
            .cell(vec![5], vec![Value::Int64(50)])
            .unwrap()
            .build();
        array.cursor(0).unwrap().chunk().unwrap()
    }

    #[test]
    fn test_materialize_copies_cells() {
        let m = MaterializedChunk::materialize(chunk().as_ref(), IterationMode::NONE).unwrap();
        assert_eq!(
            m.cells(),
            &[(vec![2], Value::Int64(20)), (vec![5], Value::Int64(50))]
        );
        assert_eq!(m.first_position(false), vec![0]);
        assert_eq!(m.last_position(false), vec![9]);
        assert!(m.verify());
    }

    #[test]
    fn test_cursor_over_materialized() {
        let m = MaterializedChunk::materialize(chunk().as_ref(), IterationMode::NONE).unwrap();
        let mut cursor = m.cell_cursor(IterationMode::NONE).unwrap();
        assert!(cursor.set_position(&vec![5]).unwrap());
        assert_eq!(cursor.item().unwrap(), Value::Int64(50));
        assert!(!cursor.is_empty().unwrap());
        cursor.advance().unwrap();
        assert!(cursor.end());
        assert!(cursor.item().is_err());
        assert!(!cursor.set_position(&vec![3]).unwrap());
    }

    #[test]
    fn test_identical_content_identical_checksum() {
        let a = MaterializedChunk::materialize(chunk().as_ref(), IterationMode::NONE).unwrap();
        let b = MaterializedChunk::materialize(chunk().as_ref(), IterationMode::NONE).unwrap();
        assert_eq!(a.checksum(), b.checksum());
    }
}
