//! Configuration loading for docschat.

mod file_config;
mod loader;

pub use file_config::{FileAgentConfig, FileBackendConfig, FileConfig, FileLoggingConfig};
pub use loader::ConfigLoader;
