//! Chunk-level merge of storage and range positions
//!
//! Two ascending streams are merged:
//! - S, the input's cursor over chunks that exist
//! - R, a [`ChunkPositionCursor`] over chunk positions that intersect
//!   the ranges
//!
//! A chunk is yielded when it is in both. S steps one chunk at a time;
//! when its chunk lies outside the ranges, R jumps ahead and S is probed
//! directly at R's next position. A failed probe puts S back where it
//! was before the merge continues.

use std::sync::Arc;

use crate::array::{ArrayCursor, ArrayError, ArrayResult, AttributeId, Chunk, Coordinates};
use crate::observability::{log_event, Event, Logger, Severity};
use crate::ranges::ChunkPositionCursor;

use super::array::BetweenInner;

/// Array cursor over one attribute of a `BetweenArray`
pub struct GridCursor {
    array: Arc<BetweenInner>,
    attribute: AttributeId,
    input_attribute: AttributeId,
    /// S
    storage: Box<dyn ArrayCursor>,
    /// R
    chunk_positions: ChunkPositionCursor,
    /// One per predicate binding; set for bindings that read an attribute
    /// other than `input_attribute`
    companions: Vec<Option<(AttributeId, Box<dyn ArrayCursor>)>>,
    positioned: bool,
    extended_hint: usize,
}

impl GridCursor {
    pub(crate) fn new(array: Arc<BetweenInner>, attribute: AttributeId) -> ArrayResult<Self> {
        if attribute >= array.desc.num_attributes() {
            return Err(ArrayError::invalid_attribute(
                attribute,
                array.desc.num_attributes(),
            ));
        }
        let input_attribute = array.input_attribute(attribute);
        let storage = array.input.cursor(input_attribute)?;
        let chunk_positions = ChunkPositionCursor::new(&array.ranges, &array.desc)?;

        let mut companions = Vec::new();
        if let Some(predicate) = &array.predicate {
            for binding in predicate.bindings() {
                let companion = match binding.attribute() {
                    Some(attr) if attr != input_attribute => {
                        Some((attr, array.input.cursor(attr)?))
                    }
                    _ => None,
                };
                companions.push(companion);
            }
        }

        let mut cursor = Self {
            array,
            attribute,
            input_attribute,
            storage,
            chunk_positions,
            companions,
            positioned: false,
            extended_hint: 0,
        };
        cursor.restart()?;
        Ok(cursor)
    }

    /// Attribute of the filtered array this cursor iterates
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    /// Input attribute whose chunks drive the iteration
    pub fn input_attribute(&self) -> AttributeId {
        self.input_attribute
    }

    pub(crate) fn input_chunk(&self) -> ArrayResult<Arc<dyn Chunk>> {
        if !self.positioned {
            return Err(ArrayError::no_current_element("between array cursor"));
        }
        self.storage.chunk()
    }

    pub(crate) fn companion_chunks(
        &self,
    ) -> ArrayResult<Vec<Option<(AttributeId, Arc<dyn Chunk>)>>> {
        self.companions
            .iter()
            .map(|slot| match slot {
                Some((attr, cursor)) => Ok(Some((*attr, cursor.chunk()?))),
                None => Ok(None),
            })
            .collect()
    }

    fn in_extended(&mut self, pos: &Coordinates) -> bool {
        self.array
            .extended
            .find_one_that_contains(pos, &mut self.extended_hint)
    }

    /// Moves S to `target`. On a miss S returns to `current`; failing
    /// that is fatal.
    fn probe(&mut self, target: &Coordinates, current: &Coordinates) -> ArrayResult<bool> {
        self.array.metrics.increment_storage_probes();
        if self.storage.set_position(target)? {
            return Ok(true);
        }
        self.array.metrics.increment_probe_misses();
        if Logger::enabled(Severity::Trace) {
            log_event(
                Event::ChunkProbeMiss,
                &[
                    ("position", format!("{:?}", target).as_str()),
                    ("query_id", self.array.query_tag.as_str()),
                ],
            );
        }
        if !self.storage.set_position(current)? {
            log_event(
                Event::StorageRestoreFailed,
                &[
                    ("position", format!("{:?}", current).as_str()),
                    ("query_id", self.array.query_tag.as_str()),
                ],
            );
            return Err(ArrayError::operation_failed(
                "restore storage cursor",
                current,
            ));
        }
        Ok(false)
    }

    /// Steps S until its chunk is in the ranges, or either stream runs out
    fn advance_to_next_chunk_in_range(&mut self) -> ArrayResult<()> {
        self.positioned = false;
        loop {
            self.storage.advance()?;
            if self.storage.end() {
                return Ok(());
            }
            let pos = self.storage.position()?.clone();
            if self.in_extended(&pos) {
                self.chunk_positions.advance_position_to_at_least(&pos);
                self.positioned = true;
                return Ok(());
            }

            let advanced = self.chunk_positions.advance_position_to_at_least(&pos);
            if self.chunk_positions.end() {
                return Ok(());
            }
            if !(advanced && self.chunk_positions.position()? > &pos) {
                self.chunk_positions.advance();
                if self.chunk_positions.end() {
                    return Ok(());
                }
            }

            let target = self.chunk_positions.position()?.clone();
            if self.probe(&target, &pos)? {
                self.positioned = true;
                return Ok(());
            }
        }
    }

    /// Bookkeeping for a newly reached chunk
    fn on_chunk_selected(&mut self) -> ArrayResult<()> {
        let pos = self.storage.position()?.clone();
        for (attr, companion) in self.companions.iter_mut().flatten() {
            if !companion.end() && companion.position()? == &pos {
                continue;
            }
            if !companion.set_position(&pos)? {
                log_event(
                    Event::CursorMisaligned,
                    &[
                        ("attribute", attr.to_string().as_str()),
                        ("level", "chunk"),
                        ("position", format!("{:?}", pos).as_str()),
                        ("query_id", self.array.query_tag.as_str()),
                    ],
                );
                return Err(ArrayError::misaligned(*attr, &pos));
            }
        }

        self.array.metrics.increment_chunks_yielded();
        if Logger::enabled(Severity::Trace) {
            log_event(
                Event::ChunkSelected,
                &[
                    ("attribute", self.attribute.to_string().as_str()),
                    ("position", format!("{:?}", pos).as_str()),
                    ("query_id", self.array.query_tag.as_str()),
                ],
            );
        }
        Ok(())
    }
}

impl ArrayCursor for GridCursor {
    fn end(&self) -> bool {
        !self.positioned
    }

    fn advance(&mut self) -> ArrayResult<()> {
        if !self.positioned {
            return Err(ArrayError::no_current_element("between array cursor"));
        }
        self.advance_to_next_chunk_in_range()?;
        if self.positioned {
            self.on_chunk_selected()?;
        }
        Ok(())
    }

    fn position(&self) -> ArrayResult<&Coordinates> {
        if !self.positioned {
            return Err(ArrayError::no_current_element("between array cursor"));
        }
        self.storage.position()
    }

    /// Moves to the chunk containing `pos`. Returns false, leaving the
    /// cursor unpositioned, when that chunk does not exist or does not
    /// intersect the ranges.
    fn set_position(&mut self, pos: &Coordinates) -> ArrayResult<bool> {
        self.array.desc.check_dims(pos)?;
        let mut chunk_pos = pos.clone();
        self.array.desc.chunk_position_for(&mut chunk_pos);

        if self.positioned && self.storage.position()? == &chunk_pos {
            return Ok(true);
        }
        if !self.storage.set_position(&chunk_pos)? || !self.in_extended(&chunk_pos) {
            self.positioned = false;
            return Ok(false);
        }

        if self.chunk_positions.end() || self.chunk_positions.position()? > &chunk_pos {
            self.chunk_positions.restart();
        }
        self.chunk_positions.advance_position_to_at_least(&chunk_pos);
        self.positioned = true;
        self.on_chunk_selected()?;
        Ok(true)
    }

    fn restart(&mut self) -> ArrayResult<()> {
        self.positioned = false;
        self.storage.restart()?;
        self.chunk_positions.restart();
        if self.storage.end() || self.chunk_positions.end() {
            return Ok(());
        }

        let pos = self.storage.position()?.clone();
        if self.in_extended(&pos) {
            self.chunk_positions.advance_position_to_at_least(&pos);
            self.positioned = true;
        } else {
            let target = self.chunk_positions.position()?.clone();
            if self.probe(&target, &pos)? {
                self.positioned = true;
            } else {
                self.advance_to_next_chunk_in_range()?;
            }
        }

        if self.positioned {
            self.on_chunk_selected()?;
        }
        Ok(())
    }

    fn chunk(&self) -> ArrayResult<Arc<dyn Chunk>> {
        BetweenInner::create_chunk(&self.array, self)
    }
}
