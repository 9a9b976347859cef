//! Outbound payload composition.
//!
//! The user's text and the hidden document context travel to the backend as
//! separate fields. They are never concatenated: the transcript stores the
//! text exactly as typed, and the context string can never leak into the
//! visible conversation through any rendering of the user turn.

use serde::{Deserialize, Serialize};

/// The payload sent to the backend for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The user's message, verbatim.
    pub text: String,
    /// Hidden context, if the session has one configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl OutboundMessage {
    /// Compose the outbound payload for a submission.
    ///
    /// Pure transform: same inputs always yield the same payload. With no
    /// hidden context the payload is the user text alone.
    pub fn compose(text: impl Into<String>, hidden_context: Option<&str>) -> Self {
        Self {
            text: text.into(),
            context: hidden_context.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_context_payload_is_text_verbatim() {
        let message = OutboundMessage::compose("What is this?", None);
        assert_eq!(message.text, "What is this?");
        assert!(message.context.is_none());
    }

    #[test]
    fn context_travels_in_its_own_field() {
        let message = OutboundMessage::compose(
            "What is this?",
            Some("Doc: component:default/website"),
        );
        assert_eq!(message.text, "What is this?");
        assert_eq!(
            message.context.as_deref(),
            Some("Doc: component:default/website")
        );
        // The visible text never absorbs the context
        assert!(!message.text.contains("Doc:"));
    }

    #[test]
    fn compose_is_deterministic() {
        let a = OutboundMessage::compose("q", Some("ctx"));
        let b = OutboundMessage::compose("q", Some("ctx"));
        assert_eq!(a, b);
    }
}
