//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. Calls are not retried; a failed upstream request surfaces as
/// [`RagError::EmbeddingError`](crate::RagError::EmbeddingError) and the caller
/// decides whether to retry or degrade.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// issues one [`embed`](EmbeddingProvider::embed) call per text concurrently;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use rag_context::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    ///
    /// An empty string is legal and yields whatever vector the model produces.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Results are returned in input order. The first failure fails the batch.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
