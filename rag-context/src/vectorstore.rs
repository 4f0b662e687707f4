//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{SearchMatch, VectorRecord};
use crate::error::Result;

/// A namespaced storage backend for vector embeddings with similarity search.
///
/// The store is the single source of truth for ingested documents and is
/// expected to provide its own consistency for concurrent readers and writers.
/// Clients are constructed once by the host application and shared by handle.
///
/// # Example
///
/// ```rust,ignore
/// use rag_context::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert("coaching", &records).await?;
/// let matches = store.search("coaching", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records in a namespace.
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()>;

    /// Delete records by id from a namespace. Unknown ids are ignored.
    async fn delete(&self, namespace: &str, ids: &[&str]) -> Result<()>;

    /// Search for the `top_k` records most similar to `embedding`.
    ///
    /// Returns at most `top_k` matches ordered by descending similarity. The
    /// matches include metadata; the stored text may be absent.
    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchMatch>>;
}
