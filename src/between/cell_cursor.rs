//! Cell-level filtering
//!
//! A cell is visible when it lies in an inner range, or when it lies in
//! a range and the predicate evaluates to a non-null `true`. Predicate
//! parameters come from the cell's coordinates, from constants, and
//! from attribute values read either off the primary cursor or off a
//! companion cursor kept on the same cell.
//!
//! With `IGNORE_EMPTY_CELLS` only visible cells are exposed. Without it
//! every stored cell is exposed and visibility shows through `is_empty`
//! and the bitmap variants' `item`.

use std::sync::Arc;

use crate::array::{
    ArrayError, ArrayResult, AttributeId, CellCursor, Chunk, Coordinates, IterationMode, Value,
};
use crate::expr::Binding;
use crate::observability::{log_event, Event};

use super::array::BetweenInner;

/// What `item()` returns, fixed once per chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapVariant {
    /// Non-existence attribute: the stored value
    Plain,
    /// Stored existence attribute: stored bit AND visible
    Existing,
    /// Synthetic existence attribute on a boundary chunk: true in the
    /// inner ranges, the predicate value elsewhere in the ranges, false
    /// outside
    New,
    /// Synthetic existence attribute on a fully-inside chunk: always true
    Empty,
}

enum CompanionSlot {
    /// The binding reads the attribute the primary cursor iterates
    Primary,
    Cursor {
        attribute: AttributeId,
        cursor: Box<dyn CellCursor>,
    },
}

/// Cell cursor exposing the visible cells of one boundary chunk
pub struct FilterCellCursor {
    array: Arc<BetweenInner>,
    variant: BitmapVariant,
    primary: Box<dyn CellCursor>,
    /// One per predicate binding, set for ATTRIBUTE bindings
    companions: Vec<Option<CompanionSlot>>,
    params: Vec<Value>,
    ignore_empty: bool,
    visible: bool,
    range_hint: usize,
    inner_hint: usize,
}

impl FilterCellCursor {
    pub(crate) fn open(
        array: Arc<BetweenInner>,
        variant: BitmapVariant,
        input: &dyn Chunk,
        companion_chunks: &[Option<(AttributeId, Arc<dyn Chunk>)>],
        mode: IterationMode,
    ) -> ArrayResult<Self> {
        let primary = input.cell_cursor(mode)?;
        let companion_mode = mode.without(IterationMode::IGNORE_DEFAULT_VALUES);

        let mut companions = Vec::new();
        let mut params = Vec::new();
        if variant != BitmapVariant::Empty {
            if let Some(predicate) = &array.predicate {
                for (i, binding) in predicate.bindings().iter().enumerate() {
                    let slot = match (binding, companion_chunks.get(i)) {
                        (Binding::Attribute { .. }, Some(Some((attribute, chunk)))) => {
                            Some(CompanionSlot::Cursor {
                                attribute: *attribute,
                                cursor: chunk.cell_cursor(companion_mode)?,
                            })
                        }
                        (Binding::Attribute { .. }, _) => Some(CompanionSlot::Primary),
                        _ => None,
                    };
                    companions.push(slot);
                }
                params = vec![Value::Null; predicate.bindings().len()];
            }
        }

        let mut cursor = Self {
            array,
            variant,
            primary,
            companions,
            params,
            ignore_empty: mode.contains(IterationMode::IGNORE_EMPTY_CELLS),
            visible: false,
            range_hint: 0,
            inner_hint: 0,
        };
        cursor.settle()?;
        Ok(cursor)
    }

    pub fn variant(&self) -> BitmapVariant {
        self.variant
    }

    /// Whether the current cell passes the filter
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Puts every companion on the primary's cell
    fn align_companions(&mut self) -> ArrayResult<()> {
        if self.companions.is_empty() {
            return Ok(());
        }
        let pos = self.primary.position()?.clone();
        for slot in self.companions.iter_mut().flatten() {
            let CompanionSlot::Cursor { attribute, cursor } = slot else {
                continue;
            };
            if !cursor.end() && cursor.position()? == &pos {
                continue;
            }
            if !cursor.set_position(&pos)? {
                log_event(
                    Event::CursorMisaligned,
                    &[
                        ("attribute", attribute.to_string().as_str()),
                        ("level", "cell"),
                        ("position", format!("{:?}", pos).as_str()),
                        ("query_id", self.array.query_tag.as_str()),
                    ],
                );
                return Err(ArrayError::misaligned(*attribute, &pos));
            }
        }
        Ok(())
    }

    /// Steps companions forward with the primary; `align_companions`
    /// repairs any that land elsewhere
    fn advance_companions(&mut self) -> ArrayResult<()> {
        for slot in self.companions.iter_mut().flatten() {
            if let CompanionSlot::Cursor { cursor, .. } = slot {
                if !cursor.end() {
                    cursor.advance()?;
                }
            }
        }
        Ok(())
    }

    /// Fills the parameters and runs the predicate; no predicate reads
    /// as true
    fn evaluate(&mut self) -> ArrayResult<Value> {
        let array = Arc::clone(&self.array);
        let Some(predicate) = &array.predicate else {
            return Ok(Value::Bool(true));
        };
        let pos = self.primary.position()?.clone();
        for (i, binding) in predicate.bindings().iter().enumerate() {
            let value = match binding {
                Binding::Coordinate { dim } => pos.get(*dim).copied().map_or(Value::Null, Value::Int64),
                Binding::Value { value } => value.clone(),
                Binding::Attribute { .. } => match self.companions.get_mut(i) {
                    Some(Some(CompanionSlot::Primary)) => self.primary.item()?,
                    Some(Some(CompanionSlot::Cursor { cursor, .. })) => cursor.item()?,
                    _ => Value::Null,
                },
            };
            self.params[i] = value;
        }
        array.metrics.increment_cells_evaluated();
        Ok(predicate.evaluate(&self.params))
    }

    fn in_ranges(&mut self, pos: &Coordinates) -> bool {
        self.array.ranges.find_one_that_contains(pos, &mut self.range_hint)
    }

    /// Inner cells are visible without consulting the predicate
    fn in_inner(&mut self, pos: &Coordinates) -> bool {
        match &self.array.inner {
            Some(inner) => inner.find_one_that_contains(pos, &mut self.inner_hint),
            None => false,
        }
    }

    fn filter(&mut self) -> ArrayResult<bool> {
        if self.variant == BitmapVariant::Empty {
            return Ok(true);
        }
        let pos = self.primary.position()?.clone();
        if self.in_inner(&pos) {
            return Ok(true);
        }
        if self.in_ranges(&pos) {
            let value = self.evaluate()?;
            return Ok(!value.is_null() && value.as_bool());
        }
        Ok(false)
    }

    /// Aligns and filters the current cell; in ignore-empty mode moves
    /// on until a visible cell or the end
    fn settle(&mut self) -> ArrayResult<()> {
        loop {
            if self.primary.end() {
                self.visible = false;
                return Ok(());
            }
            self.align_companions()?;
            self.visible = self.filter()?;
            if self.visible || !self.ignore_empty {
                return Ok(());
            }
            self.primary.advance()?;
            self.advance_companions()?;
        }
    }
}

impl CellCursor for FilterCellCursor {
    fn end(&self) -> bool {
        self.primary.end()
    }

    fn advance(&mut self) -> ArrayResult<()> {
        self.primary.advance()?;
        self.advance_companions()?;
        self.settle()
    }

    fn position(&self) -> ArrayResult<&Coordinates> {
        self.primary.position()
    }

    /// Returns false when storage has no cell at `pos`, or in
    /// ignore-empty mode when the cell is not visible; the cursor then
    /// rests on the next visible cell.
    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool> {
        if !self.primary.set_position(pos)? {
            self.visible = false;
            return Ok(false);
        }
        self.align_companions()?;
        self.visible = self.filter()?;
        if self.ignore_empty && !self.visible {
            self.primary.advance()?;
            self.advance_companions()?;
            self.settle()?;
            return Ok(false);
        }
        Ok(true)
    }

    fn restart(&mut self) -> ArrayResult<()> {
        self.primary.restart()?;
        for slot in self.companions.iter_mut().flatten() {
            if let CompanionSlot::Cursor { cursor, .. } = slot {
                cursor.restart()?;
            }
        }
        self.settle()
    }

    fn item(&mut self) -> ArrayResult<Value> {
        match self.variant {
            BitmapVariant::Plain => self.primary.item(),
            BitmapVariant::Existing => {
                let stored = self.primary.item()?;
                Ok(Value::Bool(stored.as_bool() && self.visible))
            }
            BitmapVariant::New => {
                let pos = self.primary.position()?.clone();
                if self.in_inner(&pos) {
                    Ok(Value::Bool(true))
                } else if self.in_ranges(&pos) {
                    self.evaluate()
                } else {
                    Ok(Value::Bool(false))
                }
            }
            BitmapVariant::Empty => {
                self.primary.position()?;
                Ok(Value::Bool(true))
            }
        }
    }

    fn is_empty(&mut self) -> ArrayResult<bool> {
        if self.variant == BitmapVariant::Empty {
            self.primary.position()?;
            return Ok(false);
        }
        Ok(self.primary.is_empty()? || !self.visible)
    }
}
