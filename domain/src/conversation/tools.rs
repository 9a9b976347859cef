//! Tool invocation records.
//!
//! Each assistant turn owns an ordered list of [`ToolInvocation`]s — one per
//! tool call the assistant made while producing that response. Insertion
//! order reflects the order calls were initiated, not completion order.
//!
//! # Result pairing
//!
//! Results carry only the tool name, so a result is paired with the oldest
//! started invocation of that name that has no result yet (FIFO). This
//! tolerates concurrent calls to the same tool **only because the backend
//! guarantees ordered start/result pairing per tool name** — that is an
//! external protocol contract, not a concurrency guarantee made here. A
//! backend with out-of-order results would need a correlation id on the
//! wire instead.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Call announced, no result yet.
    Started,
    /// Result arrived with `ok = true`.
    Succeeded,
    /// Result arrived with `ok = false`.
    Failed,
}

/// A record of one external capability call made by the assistant.
///
/// Owned exclusively by its parent [`Turn`](super::entities::Turn); never
/// shared across turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Opaque structured arguments, as announced by the backend.
    pub input: serde_json::Value,
    /// Opaque structured result; absent until resolved.
    pub output: Option<serde_json::Value>,
    /// Current lifecycle state.
    pub status: ToolStatus,
}

impl ToolInvocation {
    /// Create a new invocation in `Started` state.
    pub fn started(tool_name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            input,
            output: None,
            status: ToolStatus::Started,
        }
    }

    /// Whether a result has been recorded.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.status, ToolStatus::Started)
    }

    /// Record the result and move to `Succeeded`/`Failed`.
    pub fn resolve(&mut self, output: serde_json::Value, ok: bool) {
        self.output = Some(output);
        self.status = if ok {
            ToolStatus::Succeeded
        } else {
            ToolStatus::Failed
        };
    }
}

/// FIFO pairing rule: index of the oldest `Started` invocation of
/// `tool_name` without a result.
///
/// Pure function over the invocation list; returns `None` when no pending
/// invocation matches (a protocol violation for the caller to surface).
pub fn match_pending(tools: &[ToolInvocation], tool_name: &str) -> Option<usize> {
    tools
        .iter()
        .position(|t| t.tool_name == tool_name && !t.is_resolved())
}
