//! Port for structured run logging.
//!
//! Defines the [`RunLogger`] trait for recording orchestration events
//! (routing decisions, model responses, fallbacks, consensus rounds) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable transcript of each request (JSONL).

use serde_json::Value;

/// A structured orchestration event.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The adapter adds the timestamp.
pub struct RunEvent {
    /// Event type identifier (e.g., "routing_decision", "fallback").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging orchestration events.
///
/// `log` is synchronous and infallible; adapters swallow write failures.
pub trait RunLogger: Send + Sync {
    /// Record one event.
    fn log(&self, event: RunEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoRunLogger;

impl RunLogger for NoRunLogger {
    fn log(&self, _event: RunEvent) {}
}
