//! Portal document detection.
//!
//! The documentation viewer mounts the assistant on two URL shapes:
//!
//! 1. `/docs/{namespace}/{kind}/{name}/{documentPath}`
//! 2. `/catalog/{namespace}/{kind}/{name}/docs/{documentPath}`
//!
//! [`DocumentContext::from_url_path`] recognizes both and normalizes them
//! into an entity reference plus a document path (defaulting to `index`
//! for the landing page). The resulting [`hidden_context`] sentence is sent
//! to the backend alongside the user's question — it is metadata, not
//! conversation, and never enters the visible transcript.
//!
//! [`hidden_context`]: DocumentContext::hidden_context

use serde::{Deserialize, Serialize};

/// Catalog entity reference in canonical `kind:namespace/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}

impl std::str::FromStr for EntityRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid entity ref (missing ':'): {}", s))?;
        let (namespace, name) = rest
            .split_once('/')
            .ok_or_else(|| format!("Invalid entity ref (missing '/'): {}", s))?;
        if kind.is_empty() || namespace.is_empty() || name.is_empty() {
            return Err(format!("Invalid entity ref (empty segment): {}", s));
        }
        Ok(Self::new(kind, namespace, name))
    }
}

/// The documentation page a session is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Entity whose documentation is being viewed.
    pub entity_ref: EntityRef,
    /// Path within that entity's documentation; `index` for the landing page.
    pub document_path: String,
}

impl DocumentContext {
    pub fn new(entity_ref: EntityRef, document_path: impl Into<String>) -> Self {
        Self {
            entity_ref,
            document_path: document_path.into(),
        }
    }

    /// Detect a documentation page from a portal URL path.
    ///
    /// Returns `None` for any other page — the assistant simply is not
    /// offered there.
    pub fn from_url_path(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();

        let (namespace, kind, name, rest) = match segments.as_slice() {
            ["docs", namespace, kind, name, rest @ ..] => (namespace, kind, name, rest),
            ["catalog", namespace, kind, name, "docs", rest @ ..] => (namespace, kind, name, rest),
            _ => return None,
        };

        if namespace.is_empty() || kind.is_empty() || name.is_empty() {
            return None;
        }

        let document_path = rest.join("/");
        let document_path = if document_path.is_empty() {
            "index".to_string()
        } else {
            document_path
        };

        Some(Self {
            entity_ref: EntityRef::new(*kind, *namespace, *name),
            document_path,
        })
    }

    /// The hidden-context sentence sent to the backend for this page.
    pub fn hidden_context(&self) -> String {
        format!(
            "The user is currently viewing documentation for entity \"{}\" at path \"{}\".",
            self.entity_ref, self.document_path
        )
    }
}
