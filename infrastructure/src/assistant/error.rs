//! Error types for the assistant backend adapter

use thiserror::Error;

/// Result type alias for assistant adapter operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors that can occur when communicating with the assistant backend
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Invalid backend base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse stream event: {error}\nRaw line: {raw}")]
    MalformedEvent { error: String, raw: String },
}
