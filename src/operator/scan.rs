//! Reading a whole array through the cursor contract
//!
//! The existence attribute (or attribute 0 when the schema has none)
//! drives the walk; every value attribute follows it cell by cell.
//! Cells are read in [`SCAN_MODE`], so a cell replicated into a
//! neighbour's overlap region is reported once, by its home chunk.

use serde::{Deserialize, Serialize};

use crate::array::{
    Array, ArrayCursor, ArrayError, ArrayResult, AttributeId, CellCursor, Coordinates,
    IterationMode, Value,
};

/// Visible cells of each chunk's home box only
pub const SCAN_MODE: IterationMode =
    IterationMode::IGNORE_EMPTY_CELLS.with(IterationMode::IGNORE_OVERLAPS);

/// One visible cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    pub pos: Coordinates,
    /// Values of every non-indicator attribute, in schema order
    pub values: Vec<Value>,
}

/// Chunk positions an attribute cursor yields, in order
pub fn chunk_positions(array: &dyn Array, attribute: AttributeId) -> ArrayResult<Vec<Coordinates>> {
    let mut cursor = array.cursor(attribute)?;
    let mut positions = Vec::new();
    while !cursor.end() {
        positions.push(cursor.position()?.clone());
        cursor.advance()?;
    }
    Ok(positions)
}

/// Every visible cell with all its values, in row-major order
pub fn scan_cells(array: &dyn Array) -> ArrayResult<Vec<ScanRow>> {
    let desc = array.desc();
    let driver = desc.empty_bitmap_attribute().map_or(0, |a| a.id);
    let value_attributes: Vec<AttributeId> = desc
        .attributes
        .iter()
        .filter(|a| !a.empty_indicator)
        .map(|a| a.id)
        .collect();

    let mut driver_cursor = array.cursor(driver)?;
    let mut value_cursors = value_attributes
        .iter()
        .map(|&attr| array.cursor(attr))
        .collect::<ArrayResult<Vec<_>>>()?;

    let mut rows = Vec::new();
    while !driver_cursor.end() {
        let chunk_pos = driver_cursor.position()?.clone();
        let mut cells = driver_cursor
            .chunk()?
            .cell_cursor(SCAN_MODE)?;
        let mut value_cells = Vec::with_capacity(value_cursors.len());
        for (cursor, &attr) in value_cursors.iter_mut().zip(&value_attributes) {
            value_cells.push(follow_chunk(cursor.as_mut(), attr, &chunk_pos)?);
        }

        while !cells.end() {
            let pos = cells.position()?.clone();
            let mut values = Vec::with_capacity(value_cells.len());
            for (cell, &attr) in value_cells.iter_mut().zip(&value_attributes) {
                if !cell.set_position(&pos)? {
                    return Err(ArrayError::misaligned(attr, &pos));
                }
                values.push(cell.item()?);
            }
            rows.push(ScanRow { pos, values });
            cells.advance()?;
        }
        driver_cursor.advance()?;
    }
    Ok(rows)
}

fn follow_chunk(
    cursor: &mut dyn ArrayCursor,
    attribute: AttributeId,
    chunk_pos: &Coordinates,
) -> ArrayResult<Box<dyn CellCursor>> {
    if !cursor.set_position(chunk_pos)? {
        return Err(ArrayError::misaligned(attribute, chunk_pos));
    }
    cursor.chunk()?.cell_cursor(SCAN_MODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ArrayDesc, AttributeDesc, DimensionDesc, ValueType};
    use crate::storage::MemArrayBuilder;

    fn array() -> crate::storage::MemArray {
        let desc = ArrayDesc::new(
            "pairs",
            vec![DimensionDesc::new("x", 0, 19, 10)],
            vec![
                AttributeDesc::new(0, "a", ValueType::Int64),
                AttributeDesc::new(1, "b", ValueType::String),
            ],
        )
        .unwrap();
        MemArrayBuilder::new(desc)
            .unwrap()
            .cell(vec![12], vec![Value::Int64(2), Value::from("two")])
            .unwrap()
            .cell(vec![3], vec![Value::Int64(1), Value::from("one")])
            .unwrap()
            .build()
    }

    #[test]
    fn test_scan_reads_every_attribute() {
        let rows = scan_cells(&array()).unwrap();
        assert_eq!(
            rows,
            vec![
                ScanRow {
                    pos: vec![3],
                    values: vec![Value::Int64(1), Value::from("one")],
                },
                ScanRow {
                    pos: vec![12],
                    values: vec![Value::Int64(2), Value::from("two")],
                },
            ]
        );
    }

    #[test]
    fn test_scan_reports_overlap_cells_once() {
        let mut dim = DimensionDesc::new("x", 0, 29, 10);
        dim.chunk_overlap = 2;
        let desc =
            ArrayDesc::new("halo", vec![dim], vec![AttributeDesc::new(0, "v", ValueType::Int64)])
                .unwrap();
        let mut builder = MemArrayBuilder::new(desc).unwrap();
        for x in 0..30 {
            builder.insert(vec![x], vec![Value::Int64(x * 10)]).unwrap();
        }

        let rows = scan_cells(&builder.build()).unwrap();
        let positions: Vec<Coordinates> = rows.iter().map(|r| r.pos.clone()).collect();
        assert_eq!(positions, (0..30).map(|x| vec![x]).collect::<Vec<_>>());
        assert!(rows.iter().all(|r| r.values == vec![Value::Int64(r.pos[0] * 10)]));
    }

    #[test]
    fn test_scan_mode_flags() {
        assert!(SCAN_MODE.contains(IterationMode::IGNORE_EMPTY_CELLS));
        assert!(SCAN_MODE.contains(IterationMode::IGNORE_OVERLAPS));
        assert!(!SCAN_MODE.contains(IterationMode::IGNORE_DEFAULT_VALUES));
    }

    #[test]
    fn test_chunk_positions() {
        assert_eq!(chunk_positions(&array(), 1).unwrap(), vec![vec![0], vec![10]]);
    }

    #[test]
    fn test_scan_row_json() {
        let row = ScanRow {
            pos: vec![1, 2],
            values: vec![Value::Int64(3), Value::Null],
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"pos":[1,2],"values":[3,null]}"#
        );
    }
}
