//! Assistant agent identity and display metadata.
//!
//! An agent is a backend persona with its own tool-set and prompt (e.g.
//! `docs-assistant` for documentation questions, `general` for everything
//! else). The engine treats the id as opaque; the profile carries the
//! optional copy a front end shows before the first message.

use serde::{Deserialize, Serialize};

/// Identifier of a backend assistant persona.
///
/// Selects which persona/tool-set handles the session. Immutable for the
/// session's lifetime; switching agents means creating a new session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<String>> From<T> for AgentId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

/// Display metadata for an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Short description shown as the empty-conversation title.
    pub description: Option<String>,
    /// Markdown greeting shown before the first message.
    pub welcome_message: Option<String>,
}

impl AgentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_round_trip() {
        let id = AgentId::new("docs-assistant");
        assert_eq!(id.as_str(), "docs-assistant");
        assert_eq!(id.to_string(), "docs-assistant");

        let id2: AgentId = "general".into();
        assert_eq!(id2.as_str(), "general");
    }

    #[test]
    fn profile_builder() {
        let profile = AgentProfile::new()
            .with_description("Documentation Assistant")
            .with_welcome_message("Ask me about this page.");
        assert_eq!(profile.description.as_deref(), Some("Documentation Assistant"));
        assert_eq!(profile.welcome_message.as_deref(), Some("Ask me about this page."));
    }
}
