//! Array schema: dimensions, chunking, attributes
//!
//! Chunk positions are the first coordinate of a chunk on every dimension,
//! i.e. `start_min + k * chunk_interval`. A chunk may carry an overlap
//! region that extends its bounding box on both sides.

use serde::{Deserialize, Serialize};

use super::errors::{ArrayError, ArrayResult};
use super::value::ValueType;
use super::{AttributeId, Coordinate, Coordinates};

/// Name given to the synthesized existence attribute
pub const EMPTY_TAG_NAME: &str = "empty_indicator";

/// One dimension of an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDesc {
    /// Dimension name
    pub name: String,
    /// Lowest valid coordinate
    pub start_min: Coordinate,
    /// Highest valid coordinate
    pub end_max: Coordinate,
    /// Chunk length along this dimension
    pub chunk_interval: Coordinate,
    /// Cells shared with neighbouring chunks on each side
    #[serde(default)]
    pub chunk_overlap: Coordinate,
}

impl DimensionDesc {
    /// Create a dimension without overlap
    pub fn new(
        name: impl Into<String>,
        start_min: Coordinate,
        end_max: Coordinate,
        chunk_interval: Coordinate,
    ) -> Self {
        Self {
            name: name.into(),
            start_min,
            end_max,
            chunk_interval,
            chunk_overlap: 0,
        }
    }

    /// Start of the chunk containing `coord`.
    ///
    /// `coord` may lie outside the dimension; the result saturates at the
    /// `i64` limits.
    pub fn chunk_start(&self, coord: Coordinate) -> Coordinate {
        let start = i128::from(self.start_min);
        let interval = i128::from(self.chunk_interval);
        let chunk = start + (i128::from(coord) - start).div_euclid(interval) * interval;
        chunk.clamp(i128::from(Coordinate::MIN), i128::from(Coordinate::MAX)) as Coordinate
    }

    /// Whether one chunk interval plus the overlap fits past both ends,
    /// so chunk bounds and lattice steps never overflow
    fn has_chunk_headroom(&self) -> bool {
        let reach = self.chunk_interval.checked_add(self.chunk_overlap);
        let past_end = reach.and_then(|r| self.end_max.checked_add(r));
        let before_start = reach.and_then(|r| self.start_min.checked_sub(r));
        let span = past_end.and_then(|e| e.checked_sub(self.start_min));
        before_start.is_some() && span.is_some()
    }
}

/// One attribute of an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDesc {
    /// Position of the attribute in the schema
    pub id: AttributeId,
    /// Attribute name
    pub name: String,
    /// Value type
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Marks the existence (empty/null) bitmap attribute
    #[serde(default)]
    pub empty_indicator: bool,
}

impl AttributeDesc {
    /// Create an ordinary attribute
    pub fn new(id: AttributeId, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.into(),
            value_type,
            empty_indicator: false,
        }
    }
}

/// Array schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDesc {
    /// Array name
    pub name: String,
    /// Dimensions, outermost first
    pub dimensions: Vec<DimensionDesc>,
    /// Attributes, indexed by id
    pub attributes: Vec<AttributeDesc>,
}

impl ArrayDesc {
    /// Create and validate a schema
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<DimensionDesc>,
        attributes: Vec<AttributeDesc>,
    ) -> ArrayResult<Self> {
        let desc = Self {
            name: name.into(),
            dimensions,
            attributes,
        };
        desc.validate()?;
        Ok(desc)
    }

    /// Checks dimension bounds, chunk intervals and attribute ids
    pub fn validate(&self) -> ArrayResult<()> {
        if self.dimensions.is_empty() {
            return Err(ArrayError::invalid_schema(format!(
                "Array '{}' has no dimensions",
                self.name
            )));
        }
        for dim in &self.dimensions {
            if dim.chunk_interval <= 0 {
                return Err(ArrayError::invalid_schema(format!(
                    "Dimension '{}' has non-positive chunk interval {}",
                    dim.name, dim.chunk_interval
                )));
            }
            if dim.start_min > dim.end_max {
                return Err(ArrayError::invalid_schema(format!(
                    "Dimension '{}' has start {} after end {}",
                    dim.name, dim.start_min, dim.end_max
                )));
            }
            if dim.chunk_overlap < 0 {
                return Err(ArrayError::invalid_schema(format!(
                    "Dimension '{}' has negative overlap",
                    dim.name
                )));
            }
            if !dim.has_chunk_headroom() {
                return Err(ArrayError::invalid_schema(format!(
                    "Dimension '{}' bounds [{}, {}] leave no room for chunk interval {}",
                    dim.name, dim.start_min, dim.end_max, dim.chunk_interval
                )));
            }
        }
        for (index, attr) in self.attributes.iter().enumerate() {
            if attr.id != index {
                return Err(ArrayError::invalid_schema(format!(
                    "Attribute '{}' has id {} but sits at position {}",
                    attr.name, attr.id, index
                )));
            }
            if attr.empty_indicator && attr.value_type != ValueType::Bool {
                return Err(ArrayError::invalid_schema(format!(
                    "Empty indicator '{}' must be bool",
                    attr.name
                )));
            }
        }
        if self.attributes.iter().filter(|a| a.empty_indicator).count() > 1 {
            return Err(ArrayError::invalid_schema("More than one empty indicator"));
        }
        Ok(())
    }

    /// Number of dimensions
    pub fn num_dims(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of attributes, including the empty indicator if present
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// The existence bitmap attribute, if the schema has one
    pub fn empty_bitmap_attribute(&self) -> Option<&AttributeDesc> {
        self.attributes.iter().find(|a| a.empty_indicator)
    }

    /// Schema with an existence attribute appended when none is present
    pub fn with_empty_tag(&self) -> ArrayDesc {
        let mut desc = self.clone();
        if desc.empty_bitmap_attribute().is_none() {
            let id = desc.attributes.len();
            desc.attributes.push(AttributeDesc {
                id,
                name: EMPTY_TAG_NAME.to_string(),
                value_type: ValueType::Bool,
                empty_indicator: true,
            });
        }
        desc
    }

    /// Checks that `pos` has one coordinate per dimension
    pub fn check_dims(&self, pos: &Coordinates) -> ArrayResult<()> {
        if pos.len() != self.num_dims() {
            return Err(ArrayError::dimension_mismatch(self.num_dims(), pos.len()));
        }
        Ok(())
    }

    /// Whether `pos` lies inside the dimension bounds
    pub fn contains(&self, pos: &Coordinates) -> bool {
        pos.len() == self.num_dims()
            && self
                .dimensions
                .iter()
                .zip(pos)
                .all(|(d, &c)| c >= d.start_min && c <= d.end_max)
    }

    /// Moves `pos` to the position of the chunk that contains it
    pub fn chunk_position_for(&self, pos: &mut Coordinates) {
        for (coord, dim) in pos.iter_mut().zip(&self.dimensions) {
            *coord = dim.chunk_start(*coord);
        }
    }

    /// First coordinate of the chunk at `chunk_pos`
    pub fn chunk_first_position(&self, chunk_pos: &Coordinates, with_overlap: bool) -> Coordinates {
        chunk_pos
            .iter()
            .zip(&self.dimensions)
            .map(|(&c, d)| {
                if with_overlap {
                    (c - d.chunk_overlap).max(d.start_min)
                } else {
                    c
                }
            })
            .collect()
    }

    /// Last coordinate of the chunk at `chunk_pos`, clipped to the array bounds
    pub fn chunk_last_position(&self, chunk_pos: &Coordinates, with_overlap: bool) -> Coordinates {
        chunk_pos
            .iter()
            .zip(&self.dimensions)
            .map(|(&c, d)| {
                let overlap = if with_overlap { d.chunk_overlap } else { 0 };
                (c + d.chunk_interval - 1 + overlap).min(d.end_max)
            })
            .collect()
    }
}
