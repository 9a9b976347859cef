//! Conversation domain module — turns, the transcript, and stream events.

pub mod entities;
pub mod stream;
pub mod tools;
pub mod transcript;
