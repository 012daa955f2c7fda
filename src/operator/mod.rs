//! The window operator
//!
//! Turns a [`BetweenWindow`] over an input array into a
//! [`BetweenArray`]: the clamped window becomes the range set, the
//! window shrunk on boundary-flagged dimensions becomes the inner range
//! set. The result's schema is the input's plus an existence attribute.

mod scan;
mod window;

use std::sync::Arc;

use crate::array::{Array, ArrayResult};
use crate::between::BetweenArray;
use crate::config::GridConfig;
use crate::expr::Predicate;

pub use scan::{chunk_positions, scan_cells, ScanRow, SCAN_MODE};
pub use window::BetweenWindow;

/// Builds filtered arrays from windows
pub struct BetweenOperator;

impl BetweenOperator {
    /// Applies `window` with the process-wide configuration
    pub fn execute(
        input: Arc<dyn Array>,
        predicate: Option<Predicate>,
        window: &BetweenWindow,
    ) -> ArrayResult<BetweenArray> {
        Self::execute_with_config(input, predicate, window, GridConfig::global())
    }

    /// Applies `window` with an explicit configuration
    pub fn execute_with_config(
        input: Arc<dyn Array>,
        predicate: Option<Predicate>,
        window: &BetweenWindow,
        config: &GridConfig,
    ) -> ArrayResult<BetweenArray> {
        let (ranges, inner) = window.range_sets(input.desc())?;
        BetweenArray::with_cache_capacity(
            input,
            ranges,
            inner,
            predicate,
            config.result_prefetch_queue_size,
        )
    }
}
