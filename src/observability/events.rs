//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is
//! logged at.

use std::fmt;

use super::logger::Severity;

/// Events emitted by aerogrid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,
    /// Configuration installed process-wide
    ConfigInstalled,

    // Input
    /// Array file loaded
    ArrayLoaded,

    // Between array
    /// Filtered array constructed
    BetweenArrayCreated,
    /// Grid cursor reached a chunk that exists and intersects the ranges
    ChunkSelected,
    /// A storage probe found no chunk at a suggested position
    ChunkProbeMiss,
    /// Materialized chunk evicted from the cache
    CacheEviction,

    // Consistency failures
    /// A companion cursor could not follow the primary cursor (FATAL)
    CursorMisaligned,
    /// Storage cursor could not return to a position it held (FATAL)
    StorageRestoreFailed,
    /// Cached chunk does not match the chunk it was requested for (FATAL)
    CacheChunkMismatch,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigInstalled => "CONFIG_INSTALLED",
            Event::ArrayLoaded => "ARRAY_LOADED",
            Event::BetweenArrayCreated => "BETWEEN_ARRAY_CREATED",
            Event::ChunkSelected => "CHUNK_SELECTED",
            Event::ChunkProbeMiss => "CHUNK_PROBE_MISS",
            Event::CacheEviction => "CACHE_EVICTION",
            Event::CursorMisaligned => "CURSOR_MISALIGNED",
            Event::StorageRestoreFailed => "STORAGE_RESTORE_FAILED",
            Event::CacheChunkMismatch => "CACHE_CHUNK_MISMATCH",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Event::CursorMisaligned | Event::StorageRestoreFailed | Event::CacheChunkMismatch
        )
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            _ if self.is_fatal() => Severity::Fatal,
            Event::ChunkSelected | Event::ChunkProbeMiss | Event::CacheEviction => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
