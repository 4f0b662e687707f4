//! Error types for the `rag-context` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// Read-path errors (embedding, vector search, reranking) never reach the
/// consumer of [`PromptAugmenter::enhance`](crate::PromptAugmenter::enhance);
/// they are attached to its result for logging. Write-path errors
/// ([`RagError::IngestionError`]) are returned to whoever triggered ingestion.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store was unreachable or returned a malformed response.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during result reranking.
    #[error("Reranker error ({reranker}): {message}")]
    RerankerError {
        /// The reranker that produced the error.
        reranker: String,
        /// A description of the failure.
        message: String,
    },

    /// A batch failed during ingestion. Earlier batches remain upserted.
    #[error("Ingestion error (batch {batch}, {upserted} documents already upserted): {message}")]
    IngestionError {
        /// Zero-based index of the batch that failed.
        batch: usize,
        /// Number of documents upserted by the batches before the failure.
        upserted: usize,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A failure in read-path orchestration, such as a panicking collaborator.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
