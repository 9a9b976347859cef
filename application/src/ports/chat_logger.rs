//! Port for structured conversation logging.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures session
//! events (submissions, completions, failures, tool activity) in a
//! machine-readable format (JSONL).

use serde_json::Value;

/// A structured session event for logging.
pub struct ChatEvent {
    /// Event type identifier (e.g., "submitted", "completed", "failed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ChatEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging session events to a structured log.
///
/// The `log` method is intentionally synchronous and non-fallible to avoid
/// disrupting the event loop — logging failures are silently ignored.
pub trait ChatLogger: Send + Sync {
    /// Record a session event.
    fn log(&self, event: ChatEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoChatLogger;

impl ChatLogger for NoChatLogger {
    fn log(&self, _event: ChatEvent) {}
}
