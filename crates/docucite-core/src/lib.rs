//! Docucite Core - Shared types and error taxonomy
//!
//! This crate defines the abstractions used throughout the docucite system:
//! - The `Document` ingestion model
//! - Common error types
//! - Shared search/retrieval types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, LlmConfig, LlmProvider, LoggingConfig, RagConfig, StorageConfig,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for docucite operations
#[derive(Error, Debug)]
pub enum DocuciteError {
    /// Structural misuse of the database service: creating a database that
    /// already exists, loading one that does not, adding documents without a
    /// bound store, or adding documents whose titles collide with stored ones.
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Missing metadata: {0}")]
    MissingMetadataError(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadataError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocuciteError>;

// ============================================================================
// Document Model
// ============================================================================

/// Metadata key every document must carry.
pub const TITLE_KEY: &str = "title";

/// Metadata key used for page citations in answers.
pub const PAGE_KEY: &str = "page";

/// A unit of ingestible content.
///
/// Produced by a document loader, normalized once into a (text, metadata)
/// pair for storage, then discarded. The store keeps only the derived pair,
/// not the `Document` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Text body
    pub text: String,

    /// Descriptive key-value pairs; must include a non-empty `title`
    /// before the document can be stored.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Convenience for setting the required `title` entry
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_metadata(TITLE_KEY, title)
    }

    /// The `title` metadata value, if present and non-empty
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get(TITLE_KEY)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

// ============================================================================
// Store Types
// ============================================================================

/// Snapshot of a store's contents: parallel id and metadata sequences.
///
/// Mirrors the store's `get()` contract; `ids[i]` and `metadatas[i]`
/// describe the same record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreContents {
    pub ids: Vec<String>,
    pub metadatas: Vec<HashMap<String, String>>,
}

impl StoreContents {
    /// Number of records in the snapshot
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Lowercased titles of all records, for case-insensitive comparisons
    pub fn lowercase_titles(&self) -> Vec<String> {
        self.metadatas
            .iter()
            .filter_map(|m| m.get(TITLE_KEY))
            .map(|t| t.to_lowercase())
            .collect()
    }
}

/// A scored passage returned from similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredText {
    /// Record identifier
    pub id: String,

    /// Stored text
    pub text: String,

    /// Stored metadata (includes `title`, optionally `page`)
    pub metadata: HashMap<String, String>,

    /// Cosine similarity to the query (higher is better)
    pub score: f32,
}

impl ScoredText {
    /// The `page` metadata value, if any
    pub fn page(&self) -> Option<&str> {
        self.metadata.get(PAGE_KEY).map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("some text")
            .with_title("Report")
            .with_metadata("page", "3");

        assert_eq!(doc.text, "some text");
        assert_eq!(doc.title(), Some("Report"));
        assert_eq!(doc.metadata.get("page").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_document_empty_title_is_none() {
        let doc = Document::new("text").with_title("");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_store_contents_lowercase_titles() {
        let contents = StoreContents {
            ids: vec!["1".into(), "2".into()],
            metadatas: vec![
                HashMap::from([("title".to_string(), "Report".to_string())]),
                HashMap::from([("title".to_string(), "NOTES".to_string())]),
            ],
        };

        assert_eq!(contents.len(), 2);
        assert_eq!(contents.lowercase_titles(), vec!["report", "notes"]);
    }

    #[test]
    fn test_error_display() {
        let err = DocuciteError::DatabaseError("store not bound".to_string());
        assert_eq!(err.to_string(), "Database error: store not bound");
    }
}
