//! Ports (interfaces) to be implemented by infrastructure adapters.

pub mod chat_gateway;
pub mod chat_logger;
