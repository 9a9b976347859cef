//! Infrastructure layer for docschat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod assistant;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use assistant::{
    error::{AssistantError, Result},
    gateway::HttpAssistantGateway,
    protocol::WireEvent,
};
pub use config::{ConfigLoader, FileAgentConfig, FileBackendConfig, FileConfig, FileLoggingConfig};
pub use logging::JsonlChatLogger;
