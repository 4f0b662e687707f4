//! Data types for documents, stored records, retrieved candidates and chat messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar metadata attached to documents and stored records.
pub type Metadata = HashMap<String, Value>;

/// The metadata key under which a record's text is stored.
pub const TEXT_KEY: &str = "text";

/// A source document submitted for ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier. When absent, ingestion derives `doc_{position}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with no id and no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), metadata: Metadata::new() }
    }

    /// Set a caller-provided id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A vector with its id and metadata, as written to a [`VectorStore`](crate::VectorStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    /// Unique identifier within the namespace.
    pub id: String,
    /// The embedding values.
    pub values: Vec<f32>,
    /// Metadata, including the source text under [`TEXT_KEY`].
    pub metadata: Metadata,
}

/// A raw nearest-neighbour match returned by a [`VectorStore`](crate::VectorStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    /// The id of the matched record.
    pub id: String,
    /// The store's similarity score (higher is more similar).
    pub score: f32,
    /// The record metadata. The text may be missing.
    #[serde(default)]
    pub metadata: Metadata,
}

impl SearchMatch {
    /// The stored text, or `None` if the metadata carries no non-empty string under `text`.
    pub fn text(&self) -> Option<&str> {
        self.metadata.get(TEXT_KEY).and_then(Value::as_str).filter(|t| !t.is_empty())
    }
}

/// A retrieved passage being considered for the context block.
///
/// `score` is the store similarity on creation and is overwritten by the
/// [`Reranker`](crate::Reranker); it does not keep its original meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedCandidate {
    /// The passage text.
    pub text: String,
    /// The current relevance score.
    pub score: f64,
    /// Metadata carried over from the store.
    pub metadata: Metadata,
}

impl RetrievedCandidate {
    /// Create a candidate with empty metadata.
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self { text: text.into(), score, metadata: Metadata::new() }
    }

    /// Convert a store match, dropping it if it carries no text.
    pub fn from_match(m: SearchMatch) -> Option<Self> {
        let text = m.text()?.to_string();
        Some(Self { text, score: f64::from(m.score), metadata: m.metadata })
    }
}

/// The author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The end user.
    User,
    /// The assistant model.
    Assistant,
    /// A tool result.
    Tool,
}

/// One entry of the running conversation handed to the augmenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
