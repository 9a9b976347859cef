//! Streaming events for assistant session communication.
//!
//! [`TransportEvent`] represents individual events in a streaming assistant
//! response, independent of how the backend actually delivers them (HTTP
//! streaming, WebSocket, polling). The session controller applies them to
//! the transcript strictly in arrival order.
//!
//! A well-behaved stream emits any number of `TextDelta` / `ToolStart` /
//! `ToolResult` events followed by exactly one terminal event ([`Done`] or
//! [`Failure`]), after which the stream is silent.
//!
//! [`Done`]: TransportEvent::Done
//! [`Failure`]: TransportEvent::Failure

/// An event in a streaming assistant response.
///
/// Closed sum type so exhaustive handling is enforced at compile time —
/// the adapter cannot grow ad hoc event shapes without the controller
/// noticing.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text chunk to append to the active assistant turn's content.
    TextDelta(String),

    /// The assistant started a tool call.
    ToolStart {
        /// Tool name (e.g. `documentSearch`).
        tool_name: String,
        /// Opaque structured arguments.
        input: serde_json::Value,
    },

    /// A tool call finished.
    ///
    /// Resolves the oldest started invocation of `tool_name` that has no
    /// result yet (FIFO pairing — see
    /// [`Turn::resolve_tool`](super::entities::Turn::resolve_tool)).
    ToolResult {
        tool_name: String,
        /// Opaque structured result payload.
        output: serde_json::Value,
        /// Whether the tool reported success.
        ok: bool,
    },

    /// Terminal: the response completed normally.
    Done,

    /// Terminal: the stream failed; `message` is shown to the user.
    Failure(String),
}

impl TransportEvent {
    /// Returns the text content if this is a `TextDelta` event.
    pub fn text(&self) -> Option<&str> {
        match self {
            TransportEvent::TextDelta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportEvent::Done | TransportEvent::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_returns_content() {
        let event = TransportEvent::TextDelta("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn done_is_terminal() {
        let event = TransportEvent::Done;
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }

    #[test]
    fn failure_is_terminal() {
        let event = TransportEvent::Failure("backend unavailable".to_string());
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }

    #[test]
    fn tool_events_are_not_terminal() {
        let start = TransportEvent::ToolStart {
            tool_name: "documentSearch".to_string(),
            input: serde_json::json!({"query": "getting started"}),
        };
        assert!(!start.is_terminal());
        assert_eq!(start.text(), None);

        let result = TransportEvent::ToolResult {
            tool_name: "documentSearch".to_string(),
            output: serde_json::json!({"resultCount": 0}),
            ok: true,
        };
        assert!(!result.is_terminal());
    }

    #[test]
    fn events_partial_eq() {
        assert_eq!(
            TransportEvent::TextDelta("a".to_string()),
            TransportEvent::TextDelta("a".to_string())
        );
        assert_ne!(
            TransportEvent::TextDelta("a".to_string()),
            TransportEvent::Done
        );
    }
}
