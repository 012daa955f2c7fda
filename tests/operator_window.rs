//! Window operator tests
//!
//! Tests:
//! - Window bounds and boundary flags become ranges and inner ranges
//! - Cells strictly inside a flagged window skip the predicate
//! - Open, collapsed and empty windows
//! - Output schema and bounds

use std::sync::Arc;

use aerogrid::array::{
    Array, ArrayDesc, AttributeDesc, DimensionDesc, Value, ValueType, EMPTY_TAG_NAME,
};
use aerogrid::config::GridConfig;
use aerogrid::expr::{Expr, Predicate, PredicateBuilder};
use aerogrid::operator::{chunk_positions, scan_cells, BetweenOperator, BetweenWindow};
use aerogrid::ranges::Range;
use aerogrid::storage::{MemArray, MemArrayBuilder};

// =============================================================================
// Test Utilities
// =============================================================================

fn grid_desc() -> ArrayDesc {
    ArrayDesc::new(
        "grid",
        vec![
            DimensionDesc::new("x", 0, 29, 10),
            DimensionDesc::new("y", 0, 29, 10),
        ],
        vec![AttributeDesc::new(0, "v", ValueType::Int64)],
    )
    .unwrap()
}

fn dense() -> Arc<MemArray> {
    let mut builder = MemArrayBuilder::new(grid_desc()).unwrap();
    for x in 0..30 {
        for y in 0..30 {
            builder.insert(vec![x, y], vec![Value::Int64(x * 100 + y)]).unwrap();
        }
    }
    Arc::new(builder.build())
}

/// x > 7 AND y < 23
fn window_predicate() -> Predicate {
    let mut b = PredicateBuilder::new();
    let expr = b
        .dim(0)
        .gt(Expr::lit(7i64))
        .and(b.dim(1).lt(Expr::lit(23i64)));
    b.build(expr).unwrap()
}

fn count(window: &BetweenWindow, predicate: Option<Predicate>) -> usize {
    let array =
        BetweenOperator::execute_with_config(dense(), predicate, window, &GridConfig::default())
            .unwrap();
    scan_cells(&array).unwrap().len()
}

// =============================================================================
// Windows
// =============================================================================

#[test]
fn test_closed_window_without_predicate() {
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
    assert_eq!(count(&window, None), 441);
}

#[test]
fn test_window_sets_ranges_and_inner_ranges() {
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
    let array =
        BetweenOperator::execute_with_config(dense(), None, &window, &GridConfig::default())
            .unwrap();

    assert_eq!(
        array.ranges().ranges(),
        &[Range::new(vec![5, 5], vec![25, 25])]
    );
    assert_eq!(
        array.inner_ranges().unwrap().ranges(),
        &[Range::new(vec![6, 6], vec![24, 24])]
    );
    assert_eq!(chunk_positions(&array, 1).unwrap().len(), 9);
}

/// Only cells on the window's edge are tested against the predicate
#[test]
fn test_predicate_applies_on_window_edge_only() {
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);

    // 19 * 19 interior cells, x = 25 with y in 5..=22, y = 5 with x in 8..=24
    assert_eq!(count(&window, Some(window_predicate())), 361 + 18 + 17);
}

#[test]
fn test_unflagged_dimensions_have_no_edge() {
    let window =
        BetweenWindow::closed(vec![5, 5], vec![25, 25]).with_boundary(vec![false, false]);
    assert_eq!(count(&window, Some(window_predicate())), 441);

    // Only x = 5 and x = 25 are edges now
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]).with_boundary(vec![true, false]);
    assert_eq!(count(&window, Some(window_predicate())), 19 * 21 + 18);
}

#[test]
fn test_open_window_covers_array() {
    let window = BetweenWindow::new(vec![None, None], vec![None, None]);
    assert_eq!(count(&window, None), 900);
}

#[test]
fn test_collapsed_window_has_no_interior() {
    let window = BetweenWindow::closed(vec![5, 5], vec![5, 25]);
    let array =
        BetweenOperator::execute_with_config(dense(), None, &window, &GridConfig::default())
            .unwrap();
    assert!(array.inner_ranges().unwrap().is_empty());
    assert_eq!(scan_cells(&array).unwrap().len(), 21);

    // x = 5 everywhere, so x > 7 rejects every cell
    assert_eq!(count(&window, Some(window_predicate())), 0);
}

#[test]
fn test_inverted_window_is_empty() {
    let window = BetweenWindow::closed(vec![20, 20], vec![10, 10]);
    let array =
        BetweenOperator::execute_with_config(dense(), None, &window, &GridConfig::default())
            .unwrap();
    assert!(array.ranges().is_empty());
    assert!(chunk_positions(&array, 0).unwrap().is_empty());
}

#[test]
fn test_window_arity_mismatch() {
    let window = BetweenWindow::closed(vec![5], vec![25]);
    let err = BetweenOperator::execute_with_config(dense(), None, &window, &GridConfig::default())
        .err()
        .unwrap();
    assert_eq!(err.code().code(), "AERO_DIMENSION_MISMATCH");
}

// =============================================================================
// Output Schema
// =============================================================================

#[test]
fn test_output_schema_gains_existence_attribute() {
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
    let array =
        BetweenOperator::execute_with_config(dense(), None, &window, &GridConfig::default())
            .unwrap();

    let desc = array.desc();
    assert_eq!(desc.num_attributes(), 2);
    let tag = desc.empty_bitmap_attribute().unwrap();
    assert_eq!(tag.id, 1);
    assert_eq!(tag.name, EMPTY_TAG_NAME);
    assert_eq!(tag.value_type, ValueType::Bool);
    assert_eq!(desc.dimensions, grid_desc().dimensions);
}

#[test]
fn test_output_boundaries() {
    let desc = grid_desc();
    let window = BetweenWindow::new(vec![Some(5), None], vec![Some(25), Some(12)]);

    let bounds = window
        .output_boundaries(&desc, &Range::new(vec![0, 3], vec![20, 29]))
        .unwrap();
    assert_eq!(bounds, Some(Range::new(vec![5, 3], vec![20, 12])));

    let disjoint = window
        .output_boundaries(&desc, &Range::new(vec![26, 0], vec![29, 29]))
        .unwrap();
    assert_eq!(disjoint, None);
}

#[test]
fn test_cache_capacity_from_config() {
    let window = BetweenWindow::closed(vec![5, 5], vec![25, 25]);
    let config = GridConfig {
        result_prefetch_queue_size: 7,
        ..GridConfig::default()
    };
    let array = BetweenOperator::execute_with_config(dense(), None, &window, &config).unwrap();
    assert_eq!(array.cache().capacity(), 7);

    // Nothing installs a configuration in this process
    let array = BetweenOperator::execute(dense(), None, &window).unwrap();
    assert_eq!(array.cache().capacity(), 4);
}
