//! Axis-aligned inclusive boxes

use serde::{Deserialize, Serialize};

use crate::array::Coordinates;

/// An inclusive box `[low, high]` over every dimension.
///
/// A range with `low[i] > high[i]` on any dimension is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Lowest corner
    pub low: Coordinates,
    /// Highest corner
    pub high: Coordinates,
}

impl Range {
    /// Create a range from its corners
    pub fn new(low: Coordinates, high: Coordinates) -> Self {
        Self { low, high }
    }

    /// Number of dimensions
    pub fn num_dims(&self) -> usize {
        self.low.len()
    }

    /// True when no point lies inside
    pub fn is_empty(&self) -> bool {
        self.low.len() != self.high.len() || self.low.iter().zip(&self.high).any(|(l, h)| l > h)
    }

    /// Whether `point` lies inside
    pub fn contains_point(&self, point: &Coordinates) -> bool {
        point.len() == self.low.len()
            && point
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(p, (l, h))| l <= p && p <= h)
    }

    /// Whether `other` lies entirely inside
    pub fn contains_range(&self, other: &Range) -> bool {
        !other.is_empty()
            && other.num_dims() == self.num_dims()
            && (0..self.num_dims())
                .all(|i| self.low[i] <= other.low[i] && other.high[i] <= self.high[i])
    }

    /// Whether the two boxes share at least one point
    pub fn intersects(&self, other: &Range) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.num_dims() == self.num_dims()
            && (0..self.num_dims())
                .all(|i| self.low[i] <= other.high[i] && other.low[i] <= self.high[i])
    }

    /// The common box, if any
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        if !self.intersects(other) {
            return None;
        }
        let low = self.low.iter().zip(&other.low).map(|(a, b)| *a.max(b)).collect();
        let high = self.high.iter().zip(&other.high).map(|(a, b)| *a.min(b)).collect();
        Some(Range::new(low, high))
    }
}
