//! Docucite Vector - Vector store abstraction
//!
//! Provides the narrow interfaces the database service depends on: an
//! embedding function, a vector store with similarity search, and an opener
//! that binds a store to a filesystem path (or to memory when no path is
//! given). Concrete implementations: HTTP embedding clients and a local
//! file-backed store.

use async_trait::async_trait;
use docucite_core::{Result, ScoredText, StoreContents};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub mod embedding;
pub mod local_store;

pub use embedding::{create_embedding_client, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding};
pub use local_store::{LocalStore, LocalStoreOpener};

/// Trait for vector store operations
///
/// The store owns embedding-at-insert: `add_texts` computes embeddings via
/// the bound embedding function and assigns record identifiers.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and insert a batch of texts with their metadata.
    ///
    /// Returns the store-assigned identifiers, in input order.
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<Vec<String>>;

    /// Snapshot of all record ids and metadata
    async fn get(&self) -> Result<StoreContents>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;

    /// Search for the passages most similar to a query
    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredText>>;
}

/// Factory for binding a [`VectorStore`] to a location.
///
/// `None` opens a memory-only store; `Some(path)` opens a store persisted
/// under that directory. The database service goes through this trait so
/// tests can substitute in-memory fakes.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self, path: Option<&Path>) -> Result<Arc<dyn VectorStore>>;
}
