//! Wire protocol types for the assistant backend's chat stream.
//!
//! The backend answers a chat request with a newline-delimited JSON event
//! stream: one tagged object per line, any number of `delta` / `tool_start`
//! / `tool_end` events, then exactly one `done` or `error`. Blank lines are
//! keep-alive padding and carry nothing.
//!
//! This module owns the serde shapes and the pure line-level parsing; the
//! [`gateway`](super::gateway) owns the byte stream and the channel.

use docschat_domain::{OutboundMessage, TransportEvent};
use serde::{Deserialize, Serialize};

use super::error::AssistantError;

/// Request body for one chat submission.
///
/// `context` is the hidden document context; it is a sibling of `message`,
/// never merged into it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl From<&OutboundMessage> for ChatStreamBody {
    fn from(message: &OutboundMessage) -> Self {
        Self {
            message: message.text.clone(),
            context: message.context.clone(),
        }
    }
}

/// One event line from the backend stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    /// Incremental response text.
    Delta { text: String },
    /// The assistant invoked a tool.
    ToolStart {
        tool: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// A tool invocation finished.
    ToolEnd {
        tool: String,
        #[serde(default)]
        output: serde_json::Value,
        #[serde(default = "default_ok")]
        ok: bool,
    },
    /// Terminal: response complete.
    Done,
    /// Terminal: the backend failed mid-response.
    Error { message: String },
}

fn default_ok() -> bool {
    true
}

impl WireEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WireEvent::Done | WireEvent::Error { .. })
    }
}

impl From<WireEvent> for TransportEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Delta { text } => TransportEvent::TextDelta(text),
            WireEvent::ToolStart { tool, input } => TransportEvent::ToolStart {
                tool_name: tool,
                input,
            },
            WireEvent::ToolEnd { tool, output, ok } => TransportEvent::ToolResult {
                tool_name: tool,
                output,
                ok,
            },
            WireEvent::Done => TransportEvent::Done,
            WireEvent::Error { message } => TransportEvent::Failure(message),
        }
    }
}

/// Parse one stream line.
///
/// Pure function called once per frame by the gateway's reader task.
/// Returns `None` for keep-alive padding (blank lines).
pub fn parse_line(line: &str) -> Result<Option<WireEvent>, AssistantError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| AssistantError::MalformedEvent {
            error: e.to_string(),
            raw: line.to_string(),
        })
}

/// Split completed lines off the front of the byte buffer.
///
/// Leaves any trailing partial line (no `\n` yet) in the buffer for the
/// next chunk; a UTF-8 sequence split across chunks is therefore never cut.
pub fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline).collect();
        lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
    }
    lines
}
