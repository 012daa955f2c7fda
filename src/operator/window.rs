//! Query windows
//!
//! A window gives each dimension an optional low and high bound plus a
//! boundary flag. Missing bounds and bounds beyond the dimension fall
//! back to the dimension's own limits. On flagged dimensions the inner
//! window is one cell narrower on each side: cells on a flagged bound
//! still need the predicate, cells strictly inside do not.

use serde::{Deserialize, Serialize};

use crate::array::{ArrayDesc, ArrayError, ArrayResult, Coordinate, Coordinates};
use crate::ranges::{Range, RangeSet};

/// Per-dimension window bounds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BetweenWindow {
    pub low: Vec<Option<Coordinate>>,
    pub high: Vec<Option<Coordinate>>,
    /// Missing entries count as `true`
    #[serde(default)]
    pub boundary: Vec<bool>,
}

impl BetweenWindow {
    pub fn new(low: Vec<Option<Coordinate>>, high: Vec<Option<Coordinate>>) -> Self {
        Self {
            low,
            high,
            boundary: Vec::new(),
        }
    }

    /// Window with every bound present
    pub fn closed(low: Coordinates, high: Coordinates) -> Self {
        Self::new(
            low.into_iter().map(Some).collect(),
            high.into_iter().map(Some).collect(),
        )
    }

    pub fn with_boundary(mut self, flags: Vec<bool>) -> Self {
        self.boundary = flags;
        self
    }

    fn is_flagged(&self, dim: usize) -> bool {
        self.boundary.get(dim).copied().unwrap_or(true)
    }

    /// Window corners clamped to the dimension limits
    pub fn clamp(&self, desc: &ArrayDesc) -> ArrayResult<Range> {
        let dims = desc.num_dims();
        if self.low.len() != dims {
            return Err(ArrayError::dimension_mismatch(dims, self.low.len()));
        }
        if self.high.len() != dims {
            return Err(ArrayError::dimension_mismatch(dims, self.high.len()));
        }
        if self.boundary.len() > dims {
            return Err(ArrayError::dimension_mismatch(dims, self.boundary.len()));
        }

        let low = desc
            .dimensions
            .iter()
            .zip(&self.low)
            .map(|(d, bound)| match bound {
                Some(v) if *v >= d.start_min => *v,
                _ => d.start_min,
            })
            .collect();
        let high = desc
            .dimensions
            .iter()
            .zip(&self.high)
            .map(|(d, bound)| match bound {
                Some(v) if *v <= d.end_max => *v,
                _ => d.end_max,
            })
            .collect();
        Ok(Range::new(low, high))
    }

    /// The clamped window shrunk by one cell on flagged dimensions
    pub fn inner_window(&self, desc: &ArrayDesc) -> ArrayResult<Range> {
        let outer = self.clamp(desc)?;
        let mut low = outer.low;
        let mut high = outer.high;
        for dim in 0..low.len() {
            if self.is_flagged(dim) {
                low[dim] = low[dim].saturating_add(1);
                high[dim] = high[dim].saturating_sub(1);
            }
        }
        Ok(Range::new(low, high))
    }

    /// Range set and inner range set for the window.
    ///
    /// The inner set is always present. It is empty when the inner window
    /// is, so no chunk is then treated as fully inside. Both sets are
    /// empty when the window itself is.
    pub fn range_sets(&self, desc: &ArrayDesc) -> ArrayResult<(RangeSet, Option<RangeSet>)> {
        let dims = desc.num_dims();
        let outer = self.clamp(desc)?;
        let inner = self.inner_window(desc)?;

        let mut ranges = RangeSet::new(dims);
        let mut inner_ranges = RangeSet::new(dims);
        if !inner.is_empty() {
            ranges.insert(outer)?;
            inner_ranges.insert(inner)?;
        } else if !outer.is_empty() {
            ranges.insert(outer)?;
        }
        ranges.build_index();
        inner_ranges.build_index();
        Ok((ranges, Some(inner_ranges)))
    }

    /// Physical bounds of the result: the input's bounds cut to the window
    pub fn output_boundaries(
        &self,
        desc: &ArrayDesc,
        input_bounds: &Range,
    ) -> ArrayResult<Option<Range>> {
        let window = self.clamp(desc)?;
        if input_bounds.num_dims() != window.num_dims() {
            return Err(ArrayError::dimension_mismatch(
                window.num_dims(),
                input_bounds.num_dims(),
            ));
        }
        Ok(input_bounds.intersection(&window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{AttributeDesc, DimensionDesc, ValueType};

    fn desc() -> ArrayDesc {
        ArrayDesc::new(
            "grid",
            vec![
                DimensionDesc::new("x", 0, 29, 10),
                DimensionDesc::new("y", -5, 29, 10),
            ],
            vec![AttributeDesc::new(0, "v", ValueType::Int64)],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_and_out_of_range_bounds_clamped() {
        let window = BetweenWindow::new(vec![None, Some(-100)], vec![Some(500), None]);
        assert_eq!(
            window.clamp(&desc()).unwrap(),
            Range::new(vec![0, -5], vec![29, 29])
        );
    }

    #[test]
    fn test_in_range_bounds_kept() {
        let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
        assert_eq!(
            window.clamp(&desc()).unwrap(),
            Range::new(vec![5, 5], vec![25, 25])
        );
    }

    #[test]
    fn test_missing_flags_default_to_true() {
        let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]).with_boundary(vec![false]);
        assert_eq!(
            window.inner_window(&desc()).unwrap(),
            Range::new(vec![5, 6], vec![25, 24])
        );
    }

    #[test]
    fn test_range_sets_with_inner_window() {
        let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
        let (ranges, inner) = window.range_sets(&desc()).unwrap();
        assert_eq!(ranges.ranges(), &[Range::new(vec![5, 5], vec![25, 25])]);
        assert_eq!(
            inner.unwrap().ranges(),
            &[Range::new(vec![6, 6], vec![24, 24])]
        );
    }

    #[test]
    fn test_single_cell_window_has_empty_inner_set() {
        let window = BetweenWindow::closed(vec![7, 7], vec![7, 7]);
        let (ranges, inner) = window.range_sets(&desc()).unwrap();
        assert_eq!(ranges.len(), 1);
        assert!(inner.unwrap().is_empty());
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let window = BetweenWindow::closed(vec![20, 5], vec![10, 25]);
        let (ranges, inner) = window.range_sets(&desc()).unwrap();
        assert!(ranges.is_empty());
        assert!(inner.unwrap().is_empty());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let window = BetweenWindow::closed(vec![1], vec![2]);
        assert!(window.clamp(&desc()).is_err());
        let flags = BetweenWindow::closed(vec![1, 1], vec![2, 2]).with_boundary(vec![true; 3]);
        assert!(flags.range_sets(&desc()).is_err());
    }

    #[test]
    fn test_output_boundaries() {
        let window = BetweenWindow::new(vec![Some(5), None], vec![Some(25), Some(12)]);
        let input = Range::new(vec![0, 0], vec![20, 20]);
        assert_eq!(
            window.output_boundaries(&desc(), &input).unwrap(),
            Some(Range::new(vec![5, 0], vec![20, 12]))
        );

        let disjoint = Range::new(vec![26, 0], vec![29, 3]);
        let narrow = BetweenWindow::closed(vec![0, 5], vec![25, 25]);
        assert_eq!(narrow.output_boundaries(&desc(), &disjoint).unwrap(), None);
    }
}
