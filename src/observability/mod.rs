//! Observability for the remote access layer
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Per-session counters
//!
//! Observability is read-only: it never influences protocol behavior.
//!
//! # Usage
//!
//! ```ignore
//! use aeroremote::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::ChunkFetch, &[("id", "…")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_calls_issued();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
