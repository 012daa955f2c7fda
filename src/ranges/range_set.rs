//! Indexed collections of ranges
//!
//! The index sorts ranges by their low corner and keeps a running maximum
//! of the first dimension's high bound. A query binary-searches the last
//! range whose first-dimension low could still match and walks backwards
//! until the running maximum rules out everything earlier.
//!
//! Every query takes a `hint`: the index of the range that matched last
//! time. It is tried first and updated on success. Any starting value is
//! valid.

use crate::array::{ArrayDesc, ArrayError, ArrayResult, Coordinate, Coordinates};

use super::range::Range;

/// A set of ranges over a fixed number of dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    num_dims: usize,
    ranges: Vec<Range>,
    /// max(high[0]) over ranges[0..=i]
    max_high0: Vec<Coordinate>,
    indexed: bool,
}

impl RangeSet {
    /// Creates an empty set
    pub fn new(num_dims: usize) -> Self {
        Self {
            num_dims,
            ranges: Vec::new(),
            max_high0: Vec::new(),
            indexed: false,
        }
    }

    /// Creates an indexed set from ranges
    pub fn from_ranges(
        num_dims: usize,
        ranges: impl IntoIterator<Item = Range>,
    ) -> ArrayResult<Self> {
        let mut set = Self::new(num_dims);
        for range in ranges {
            set.insert(range)?;
        }
        set.build_index();
        Ok(set)
    }

    /// Adds a range. Empty ranges are dropped. Invalidates the index.
    pub fn insert(&mut self, range: Range) -> ArrayResult<()> {
        if range.low.len() != self.num_dims {
            return Err(ArrayError::dimension_mismatch(self.num_dims, range.low.len()));
        }
        if range.high.len() != self.num_dims {
            return Err(ArrayError::dimension_mismatch(self.num_dims, range.high.len()));
        }
        if range.is_empty() {
            return Ok(());
        }
        self.ranges.push(range);
        self.indexed = false;
        Ok(())
    }

    /// Sorts the ranges and builds the search index
    pub fn build_index(&mut self) {
        self.ranges
            .sort_by(|a, b| a.low.cmp(&b.low).then_with(|| a.high.cmp(&b.high)));
        self.ranges.dedup();

        self.max_high0.clear();
        let mut running = Coordinate::MIN;
        for range in &self.ranges {
            running = running.max(range.high[0]);
            self.max_high0.push(running);
        }
        self.indexed = true;
    }

    /// Number of dimensions
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Number of non-empty ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the set holds no range
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The ranges, sorted by low corner once indexed
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Finds a range containing `point`
    pub fn find_one_that_contains(&self, point: &Coordinates, hint: &mut usize) -> bool {
        if point.len() != self.num_dims || self.num_dims == 0 {
            return false;
        }
        self.search(hint, point[0], point[0], |r| r.contains_point(point))
    }

    /// Finds a range containing all of `range`
    pub fn find_one_that_contains_range(&self, range: &Range, hint: &mut usize) -> bool {
        if range.num_dims() != self.num_dims || self.num_dims == 0 || range.is_empty() {
            return false;
        }
        self.search(hint, range.low[0], range.high[0], |r| r.contains_range(range))
    }

    /// Finds a range sharing at least one point with `range`
    pub fn find_one_that_intersects(&self, range: &Range, hint: &mut usize) -> bool {
        if range.num_dims() != self.num_dims || self.num_dims == 0 || range.is_empty() {
            return false;
        }
        self.search(hint, range.high[0], range.low[0], |r| r.intersects(range))
    }

    /// Candidates satisfy `low[0] <= low0_limit` and `high[0] >= high0_floor`.
    fn search(
        &self,
        hint: &mut usize,
        low0_limit: Coordinate,
        high0_floor: Coordinate,
        matches: impl Fn(&Range) -> bool,
    ) -> bool {
        if let Some(range) = self.ranges.get(*hint) {
            if matches(range) {
                return true;
            }
        }

        if !self.indexed {
            if let Some(found) = self.ranges.iter().position(&matches) {
                *hint = found;
                return true;
            }
            return false;
        }

        let end = self.ranges.partition_point(|r| r.low[0] <= low0_limit);
        for i in (0..end).rev() {
            if self.max_high0[i] < high0_floor {
                break;
            }
            if matches(&self.ranges[i]) {
                *hint = i;
                return true;
            }
        }
        false
    }

    /// Ranges clipped to the array and with every low bound lowered to the
    /// start of its chunk.
    ///
    /// A chunk position is contained in the result iff that chunk
    /// intersects one of the original ranges.
    pub fn extended(&self, desc: &ArrayDesc) -> ArrayResult<RangeSet> {
        if desc.num_dims() != self.num_dims {
            return Err(ArrayError::dimension_mismatch(desc.num_dims(), self.num_dims));
        }
        let mut extended = RangeSet::new(self.num_dims);
        for range in &self.ranges {
            if let Some(clipped) = clip_to_array(range, desc) {
                let mut low = clipped.low;
                desc.chunk_position_for(&mut low);
                extended.insert(Range::new(low, clipped.high))?;
            }
        }
        extended.build_index();
        Ok(extended)
    }

    /// Ranges shrunk by one cell on both sides of every flagged dimension.
    ///
    /// Dimensions without a flag count as flagged. Ranges that vanish
    /// are dropped.
    pub fn inner(&self, boundary_flags: &[bool]) -> RangeSet {
        let mut inner = RangeSet::new(self.num_dims);
        for range in &self.ranges {
            let mut low = range.low.clone();
            let mut high = range.high.clone();
            for i in 0..self.num_dims {
                if boundary_flags.get(i).copied().unwrap_or(true) {
                    low[i] = low[i].saturating_add(1);
                    high[i] = high[i].saturating_sub(1);
                }
            }
            let shrunk = Range::new(low, high);
            if !shrunk.is_empty() {
                inner.ranges.push(shrunk);
            }
        }
        inner.build_index();
        inner
    }
}

/// Intersection of `range` with the array bounds
pub(crate) fn clip_to_array(range: &Range, desc: &ArrayDesc) -> Option<Range> {
    let low: Coordinates = range
        .low
        .iter()
        .zip(&desc.dimensions)
        .map(|(&c, d)| c.max(d.start_min))
        .collect();
    let high: Coordinates = range
        .high
        .iter()
        .zip(&desc.dimensions)
        .map(|(&c, d)| c.min(d.end_max))
        .collect();
    let clipped = Range::new(low, high);
    (!clipped.is_empty()).then_some(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{AttributeDesc, DimensionDesc, ValueType};

    fn grid_2d() -> ArrayDesc {
        ArrayDesc::new(
            "grid",
            vec![
                DimensionDesc::new("x", 0, 39, 10),
                DimensionDesc::new("y", 0, 39, 10),
            ],
            vec![AttributeDesc::new(0, "v", ValueType::Int64)],
        )
        .unwrap()
    }

    fn scattered() -> RangeSet {
        RangeSet::from_ranges(
            2,
            vec![
                Range::new(vec![30, 0], vec![35, 5]),
                Range::new(vec![0, 0], vec![3, 3]),
                Range::new(vec![10, 10], vec![20, 20]),
                Range::new(vec![2, 30], vec![40, 31]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_insert_rejects_wrong_dims() {
        let mut set = RangeSet::new(2);
        let err = set.insert(Range::new(vec![0], vec![1])).unwrap_err();
        assert_eq!(err.code().code(), "AERO_DIMENSION_MISMATCH");
    }

    #[test]
    fn test_empty_ranges_dropped() {
        let set = RangeSet::from_ranges(1, vec![Range::new(vec![5], vec![4])]).unwrap();
        assert!(set.is_empty());
        let mut hint = 0;
        assert!(!set.find_one_that_contains(&vec![5], &mut hint));
    }

    #[test]
    fn test_point_queries_match_linear_scan() {
        let set = scattered();
        let mut hint = 0;
        for x in -2..45 {
            for y in -2..35 {
                let p = vec![x, y];
                let expected = set.ranges().iter().any(|r| r.contains_point(&p));
                assert_eq!(set.find_one_that_contains(&p, &mut hint), expected, "{:?}", p);
            }
        }
    }

    #[test]
    fn test_hint_moves_to_match() {
        let set = scattered();
        let mut hint = 0;
        assert!(set.find_one_that_contains(&vec![15, 15], &mut hint));
        assert!(set.ranges()[hint].contains_point(&vec![15, 15]));

        let mut stale = 999;
        assert!(set.find_one_that_contains(&vec![1, 1], &mut stale));
    }

    #[test]
    fn test_range_queries() {
        let set = scattered();
        let mut hint = 0;
        assert!(set.find_one_that_contains_range(&Range::new(vec![12, 12], vec![18, 20]), &mut hint));
        assert!(!set.find_one_that_contains_range(&Range::new(vec![12, 12], vec![21, 20]), &mut hint));
        assert!(set.find_one_that_intersects(&Range::new(vec![20, 20], vec![29, 29]), &mut hint));
        assert!(!set.find_one_that_intersects(&Range::new(vec![21, 21], vec![29, 29]), &mut hint));
        assert!(set.find_one_that_intersects(&Range::new(vec![38, 25], vec![50, 30]), &mut hint));
    }

    #[test]
    fn test_unindexed_queries_still_correct() {
        let mut set = RangeSet::new(1);
        set.insert(Range::new(vec![10], vec![20])).unwrap();
        set.insert(Range::new(vec![0], vec![2])).unwrap();
        let mut hint = 0;
        assert!(set.find_one_that_contains(&vec![1], &mut hint));
        assert_eq!(hint, 1);
    }

    #[test]
    fn test_extended_lowers_to_chunk_start() {
        let set = RangeSet::from_ranges(2, vec![Range::new(vec![5, 5], vec![25, 25])]).unwrap();
        let extended = set.extended(&grid_2d()).unwrap();
        assert_eq!(
            extended.ranges(),
            &[Range::new(vec![0, 0], vec![25, 25])]
        );
    }

    #[test]
    fn test_extended_clips_to_array() {
        let set = RangeSet::from_ranges(
            2,
            vec![
                Range::new(vec![35, -5], vec![60, 3]),
                Range::new(vec![45, 0], vec![50, 3]),
            ],
        )
        .unwrap();
        let extended = set.extended(&grid_2d()).unwrap();
        assert_eq!(extended.ranges(), &[Range::new(vec![30, 0], vec![39, 3])]);
    }

    #[test]
    fn test_inner_shrinks_flagged_dims() {
        let set = RangeSet::from_ranges(2, vec![Range::new(vec![5, 5], vec![25, 25])]).unwrap();
        let inner = set.inner(&[true, false]);
        assert_eq!(inner.ranges(), &[Range::new(vec![6, 5], vec![24, 25])]);

        let thin = RangeSet::from_ranges(2, vec![Range::new(vec![5, 5], vec![5, 25])]).unwrap();
        assert!(thin.inner(&[true, true]).is_empty());
    }

    #[test]
    fn test_inner_at_i64_limits() {
        let set = RangeSet::from_ranges(
            2,
            vec![
                Range::new(vec![i64::MIN, 0], vec![i64::MAX, 9]),
                Range::new(vec![i64::MAX, i64::MIN], vec![i64::MAX, i64::MIN]),
            ],
        )
        .unwrap();
        let inner = set.inner(&[true, true]);
        assert_eq!(
            inner.ranges(),
            &[Range::new(vec![i64::MIN + 1, 1], vec![i64::MAX - 1, 8])]
        );
    }
}
