//! Document context and outbound payload composition.

pub mod document;
pub mod outbound;
