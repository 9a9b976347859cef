//! Domain layer for docschat
//!
//! This crate contains the core conversation model and pure session logic.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Transcript
//!
//! The [`Transcript`] is the ordered log of conversation [`Turn`]s. Turns are
//! appended in submission order and assistant turns are mutated in place while
//! a response streams. Everything handed outward is a copy, never a live
//! reference into the store.
//!
//! ## Transport events
//!
//! [`TransportEvent`] is the closed vocabulary the assistant backend speaks:
//! text deltas, tool lifecycle events, and exactly one terminal event per
//! stream.
//!
//! ## Document context
//!
//! [`DocumentContext`] describes the portal documentation page the user is
//! reading. It travels to the backend as a hidden request field and never
//! appears in the visible transcript.

pub mod agent;
pub mod context;
pub mod conversation;
pub mod core;

// Re-export commonly used types
pub use agent::{AgentId, AgentProfile};
pub use context::{
    document::{DocumentContext, EntityRef},
    outbound::OutboundMessage,
};
pub use conversation::{
    entities::{Role, Turn, TurnId, TurnStatus},
    stream::TransportEvent,
    tools::{ToolInvocation, ToolStatus},
    transcript::Transcript,
};
pub use core::error::{FailureKind, TranscriptError, UnmatchedToolResult};
