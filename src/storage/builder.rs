//! Construction of in-memory arrays

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::array::{ArrayDesc, ArrayError, ArrayResult, Coordinate, Coordinates, Value};

use super::memory::{ChunkData, MemArray};

/// Collects cells and lays them out into chunks
#[derive(Debug)]
pub struct MemArrayBuilder {
    desc: ArrayDesc,
    cells: BTreeMap<Coordinates, Vec<Value>>,
}

impl MemArrayBuilder {
    pub fn new(desc: ArrayDesc) -> ArrayResult<Self> {
        desc.validate()?;
        Ok(Self {
            desc,
            cells: BTreeMap::new(),
        })
    }

    /// Schema the cells are checked against
    pub fn desc(&self) -> &ArrayDesc {
        &self.desc
    }

    /// Stores a cell, replacing any previous value.
    ///
    /// `values` holds one value per attribute. When the schema has an
    /// existence attribute it may be left out, in which case the cell
    /// is marked present.
    pub fn insert(&mut self, pos: Coordinates, mut values: Vec<Value>) -> ArrayResult<()> {
        self.desc.check_dims(&pos)?;
        if !self.desc.contains(&pos) {
            return Err(ArrayError::invalid_cell(&pos, "outside array bounds"));
        }

        let total = self.desc.num_attributes();
        let indicator = self.desc.empty_bitmap_attribute().map(|a| a.id);
        match indicator {
            Some(id) if values.len() + 1 == total => values.insert(id, Value::Bool(true)),
            _ if values.len() == total => {}
            _ => {
                return Err(ArrayError::invalid_cell(
                    &pos,
                    format!("expected {} values, got {}", total, values.len()),
                ))
            }
        }

        for (attr, value) in self.desc.attributes.iter().zip(&values) {
            if !attr.value_type.accepts(value) {
                return Err(ArrayError::invalid_cell(
                    &pos,
                    format!(
                        "attribute '{}' expects {}, got {}",
                        attr.name,
                        attr.value_type.type_name(),
                        value
                    ),
                ));
            }
        }

        self.cells.insert(pos, values);
        Ok(())
    }

    /// Chained form of [`insert`](Self::insert)
    pub fn cell(mut self, pos: Coordinates, values: Vec<Value>) -> ArrayResult<Self> {
        self.insert(pos, values)?;
        Ok(self)
    }

    /// Number of cells collected so far
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn build(self) -> MemArray {
        let desc = self.desc;

        let home: BTreeSet<Coordinates> = self
            .cells
            .keys()
            .map(|pos| {
                let mut chunk_pos = pos.clone();
                desc.chunk_position_for(&mut chunk_pos);
                chunk_pos
            })
            .collect();

        let mut layout: BTreeMap<Coordinates, Vec<(Coordinates, Vec<Value>)>> = home
            .iter()
            .map(|p| (p.clone(), Vec::new()))
            .collect();

        // BTreeMap iteration is row-major, so every chunk's cells stay sorted
        for (pos, values) in &self.cells {
            for chunk_pos in owning_chunks(&desc, pos) {
                if let Some(cells) = layout.get_mut(&chunk_pos) {
                    cells.push((pos.clone(), values.clone()));
                }
            }
        }

        let chunks = layout
            .into_iter()
            .map(|(position, cells)| {
                Arc::new(ChunkData {
                    first: desc.chunk_first_position(&position, false),
                    last: desc.chunk_last_position(&position, false),
                    first_overlap: desc.chunk_first_position(&position, true),
                    last_overlap: desc.chunk_last_position(&position, true),
                    position,
                    cells,
                })
            })
            .collect();

        MemArray::from_chunks(desc, chunks)
    }
}

/// Chunk positions whose overlap-extended box contains `pos`
fn owning_chunks(desc: &ArrayDesc, pos: &Coordinates) -> Vec<Coordinates> {
    let per_dim: Vec<Vec<Coordinate>> = desc
        .dimensions
        .iter()
        .zip(pos)
        .map(|(dim, &c)| {
            let home = dim.chunk_start(c);
            [home - dim.chunk_interval, home, home + dim.chunk_interval]
                .into_iter()
                .filter(|&s| s >= dim.start_min && s <= dim.end_max)
                .filter(|&s| {
                    s - dim.chunk_overlap <= c && c <= s + dim.chunk_interval - 1 + dim.chunk_overlap
                })
                .collect()
        })
        .collect();

    let mut out: Vec<Coordinates> = vec![Vec::with_capacity(pos.len())];
    for options in per_dim {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |&s| {
                    let mut next = prefix.clone();
                    next.push(s);
                    next
                })
            })
            .collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Array, AttributeDesc, DimensionDesc, IterationMode, ValueType};

    fn desc_with_indicator() -> ArrayDesc {
        ArrayDesc::new(
            "flags",
            vec![DimensionDesc::new("x", 0, 19, 10)],
            vec![
                AttributeDesc::new(0, "v", ValueType::Double),
                AttributeDesc {
                    id: 1,
                    name: "exists".into(),
                    value_type: ValueType::Bool,
                    empty_indicator: true,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_indicator_filled_when_omitted() {
        let array = MemArrayBuilder::new(desc_with_indicator())
            .unwrap()
            .cell(vec![3], vec![Value::Double(1.5)])
            .unwrap()
            .build();
        assert_eq!(
            array.cell(&vec![3]),
            Some(&[Value::Double(1.5), Value::Bool(true)][..])
        );
    }

    #[test]
    fn test_rejects_bad_cells() {
        let mut builder = MemArrayBuilder::new(desc_with_indicator()).unwrap();
        let err = builder.insert(vec![20], vec![Value::Double(0.0)]).unwrap_err();
        assert_eq!(err.code().code(), "AERO_INVALID_CELL");
        assert!(builder.insert(vec![1], vec![Value::from("x")]).is_err());
        assert!(builder.insert(vec![1], vec![]).is_err());
        assert!(builder.insert(vec![1, 1], vec![Value::Double(0.0)]).is_err());
        assert!(builder.is_empty());
    }

    #[test]
    fn test_explicit_false_indicator_is_empty_cell() {
        let array = MemArrayBuilder::new(desc_with_indicator())
            .unwrap()
            .cell(vec![1], vec![Value::Double(1.0), Value::Bool(false)])
            .unwrap()
            .cell(vec![2], vec![Value::Double(2.0)])
            .unwrap()
            .build();
        let chunk = array.cursor(0).unwrap().chunk().unwrap();

        let mut visible = chunk.cell_cursor(IterationMode::IGNORE_EMPTY_CELLS).unwrap();
        assert_eq!(visible.position().unwrap(), &vec![2]);

        let mut all = chunk.cell_cursor(IterationMode::NONE).unwrap();
        assert_eq!(all.position().unwrap(), &vec![1]);
        assert!(all.is_empty().unwrap());
    }

    #[test]
    fn test_overlap_cells_replicated() {
        let mut desc = ArrayDesc::new(
            "ov",
            vec![DimensionDesc::new("x", 0, 29, 10)],
            vec![AttributeDesc::new(0, "v", ValueType::Int64)],
        )
        .unwrap();
        desc.dimensions[0].chunk_overlap = 2;
        let array = MemArrayBuilder::new(desc)
            .unwrap()
            .cell(vec![9], vec![Value::Int64(9)])
            .unwrap()
            .cell(vec![10], vec![Value::Int64(10)])
            .unwrap()
            .build();
        assert_eq!(array.cell_count(), 2);

        let mut cursor = array.cursor(0).unwrap();
        assert!(cursor.set_position(&vec![10]).unwrap());
        let chunk = cursor.chunk().unwrap();
        assert_eq!(chunk.first_position(true), vec![8]);

        let mut with_overlap = chunk.cell_cursor(IterationMode::NONE).unwrap();
        assert_eq!(with_overlap.position().unwrap(), &vec![9]);

        let mut home_only = chunk.cell_cursor(IterationMode::IGNORE_OVERLAPS).unwrap();
        assert_eq!(home_only.position().unwrap(), &vec![10]);
    }

    #[test]
    fn test_owning_chunks_without_overlap() {
        let desc = ArrayDesc::new(
            "g",
            vec![
                DimensionDesc::new("x", 0, 39, 10),
                DimensionDesc::new("y", 0, 39, 10),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(owning_chunks(&desc, &vec![15, 30]), vec![vec![10, 30]]);
    }
}
