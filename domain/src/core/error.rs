//! Domain error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::entities::TurnId;

/// Errors raised by strict transcript mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Unknown turn: {0}")]
    UnknownTurn(TurnId),
}

/// A tool result arrived that no started invocation can claim.
///
/// Indicates a backend/client desynchronization. The session controller
/// surfaces this as a protocol failure on the active turn instead of
/// dropping the event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unmatched tool result for '{tool_name}'")]
pub struct UnmatchedToolResult {
    /// Name carried by the orphaned result event.
    pub tool_name: String,
}

/// Why a turn ended in [`TurnStatus::Failed`](crate::TurnStatus::Failed).
///
/// Presentation layers render cancellation differently from transport
/// failures, so the distinction is recorded on the turn itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The user cancelled the in-flight request.
    Cancelled,
    /// No event arrived within the watchdog interval.
    Timeout,
    /// The backend or network reported an error.
    Transport,
    /// The event stream violated the session state machine's invariants.
    Protocol,
}

impl FailureKind {
    /// Check if this failure represents a user-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FailureKind::Cancelled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FailureKind::Cancelled => "cancelled",
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::Protocol => "protocol",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_turn_display() {
        let error = TranscriptError::UnknownTurn(TurnId(7));
        assert_eq!(error.to_string(), "Unknown turn: turn-7");
    }

    #[test]
    fn unmatched_tool_result_display() {
        let error = UnmatchedToolResult {
            tool_name: "documentSearch".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unmatched tool result for 'documentSearch'"
        );
    }

    #[test]
    fn is_cancelled_check() {
        assert!(FailureKind::Cancelled.is_cancelled());
        assert!(!FailureKind::Timeout.is_cancelled());
        assert!(!FailureKind::Transport.is_cancelled());
        assert!(!FailureKind::Protocol.is_cancelled());
    }
}
