//! Conversation entities — turns and their lifecycle.
//!
//! A [`Turn`] wraps a [`TurnStatus`] state machine with no-op-safe
//! transitions: calling a transition from the wrong state leaves the turn
//! unchanged rather than corrupting it.
//!
//! # State Transitions
//!
//! ```text
//! Pending ──> Streaming ──> Complete
//!        └────────────└──> Failed
//! ```

use serde::{Deserialize, Serialize};

use crate::conversation::tools::{ToolInvocation, match_pending};
use crate::core::error::{FailureKind, UnmatchedToolResult};

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the human.
    User,
    /// Produced by the assistant backend.
    Assistant,
    /// A failure rendered in place of an assistant response.
    Error,
}

/// Opaque identifier for a turn, assigned by the transcript at append.
///
/// Arena-style handle: snapshots refer to turns by id, never by reference
/// into the live store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// Lifecycle state of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Created, no response data yet (renders as a typing indicator).
    Pending,
    /// At least one event has arrived.
    Streaming,
    /// Terminal: response finished normally.
    Complete,
    /// Terminal: response failed, was cancelled, or timed out.
    Failed,
}

/// One message-equivalent unit in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Stable identifier, assigned at creation.
    pub id: TurnId,
    /// Author.
    pub role: Role,
    /// Text buffer; appended to as streaming deltas arrive.
    pub content: String,
    /// Tool calls made while producing this turn, in initiation order.
    pub tools: Vec<ToolInvocation>,
    /// Lifecycle state.
    pub status: TurnStatus,
    /// Set when `status == Failed`; distinguishes cancellation from
    /// transport and protocol failures.
    pub failure: Option<FailureKind>,
}

impl Turn {
    /// A completed user turn with the text exactly as typed.
    pub fn user(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            tools: Vec::new(),
            status: TurnStatus::Complete,
            failure: None,
        }
    }

    /// An empty assistant turn awaiting its first stream event.
    pub fn assistant(id: TurnId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            tools: Vec::new(),
            status: TurnStatus::Pending,
            failure: None,
        }
    }

    /// Whether this turn still has a request in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, TurnStatus::Pending | TurnStatus::Streaming)
    }

    /// Transition from Pending to Streaming.
    ///
    /// No-op if already past Pending.
    pub fn mark_streaming(&mut self) {
        if self.status == TurnStatus::Pending {
            self.status = TurnStatus::Streaming;
        }
    }

    /// Append a streamed text chunk.
    pub fn append_text(&mut self, chunk: &str) {
        self.content.push_str(chunk);
    }

    /// Terminal transition to Complete.
    ///
    /// No-op unless the turn is in flight.
    pub fn complete(&mut self) {
        if self.is_in_flight() {
            self.status = TurnStatus::Complete;
        }
    }

    /// Terminal transition to Failed.
    ///
    /// Partial streamed content is preserved, with `message` appended as its
    /// own paragraph; if nothing streamed yet, `message` becomes the content
    /// and the turn re-renders as an error bubble.
    pub fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        if !self.is_in_flight() {
            return;
        }
        let message = message.into();
        if self.content.is_empty() {
            self.role = Role::Error;
            self.content = message;
        } else if !message.is_empty() {
            self.content.push_str("\n\n");
            self.content.push_str(&message);
        }
        self.status = TurnStatus::Failed;
        self.failure = Some(kind);
    }

    /// Record a newly announced tool call.
    pub fn start_tool(&mut self, tool_name: impl Into<String>, input: serde_json::Value) {
        self.tools.push(ToolInvocation::started(tool_name, input));
    }

    /// Resolve a tool result against the oldest pending call of that name.
    ///
    /// FIFO pairing per the backend protocol contract (see
    /// [`tools`](super::tools) module docs). An unmatched result is a
    /// protocol violation and is returned as an error, never dropped.
    pub fn resolve_tool(
        &mut self,
        tool_name: &str,
        output: serde_json::Value,
        ok: bool,
    ) -> Result<(), UnmatchedToolResult> {
        match match_pending(&self.tools, tool_name) {
            Some(index) => {
                self.tools[index].resolve(output, ok);
                Ok(())
            }
            None => Err(UnmatchedToolResult {
                tool_name: tool_name.to_string(),
            }),
        }
    }
}
