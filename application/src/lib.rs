//! Application layer for docschat
//!
//! This crate contains the session controller use case and the port
//! definitions its adapters implement. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_gateway::{ChatGateway, ChatRequest, GatewayError, StreamHandle},
    chat_logger::{ChatEvent, ChatLogger, NoChatLogger},
};
pub use use_cases::chat_session::{
    ChatSession, ConversationSnapshot, SessionConfig, SessionError, SessionState,
};
