//! Observability for aerogrid
//!
//! - Structured JSON logging with a process-wide minimum severity
//! - Typed events, each with a fixed severity
//! - Per-array counters
//! - Lifecycle scopes for commands
//!
//! Observability is read-only: nothing here changes what a cursor
//! yields. Per-chunk events are TRACE so the default INFO threshold
//! keeps iteration quiet.

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{LogStream, Logger, Severity};
pub use metrics::{GridMetrics, GridMetricsSnapshot};
pub use scope::ObservationScope;

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ConfigLoaded, &[("path", "/tmp/aerogrid.json")]);
        log_event(Event::ChunkSelected, &[("position", "[0, 0]")]);
    }
}
