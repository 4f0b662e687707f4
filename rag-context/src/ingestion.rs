//! Document ingestion: the write path of the engine.
//!
//! Documents are processed in fixed-size batches. Each batch is embedded
//! concurrently and upserted with one store call. A failing batch aborts the
//! run; batches already upserted stay in the store, so re-runs rely on the
//! deterministic per-document ids to overwrite rather than duplicate.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{Document, Metadata, TEXT_KEY, VectorRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Counts reported by a successful ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    /// Documents upserted.
    pub documents: usize,
    /// Upsert calls made.
    pub batches: usize,
}

/// The id a document is stored under: its own id, or `doc_{position}`.
pub fn document_id(document: &Document, position: usize) -> String {
    document.id.clone().unwrap_or_else(|| format!("doc_{position}"))
}

/// Record metadata: the text under `text`, then the document's own entries.
fn record_metadata(document: &Document) -> Metadata {
    let mut metadata = Metadata::with_capacity(document.metadata.len() + 1);
    metadata.insert(TEXT_KEY.to_string(), Value::String(document.text.clone()));
    metadata.extend(document.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    metadata
}

/// Embeds documents and upserts them into a namespace of a [`VectorStore`].
pub struct IngestionPipeline {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    namespace: String,
    batch_size: usize,
}

impl IngestionPipeline {
    /// Create a pipeline writing to `config.namespace` in batches of
    /// `config.ingest_batch_size`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config` fails
    /// [`RagConfig::validate`], e.g. a zero batch size.
    pub fn new(
        config: &RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            embedding_provider,
            vector_store,
            namespace: config.namespace.clone(),
            batch_size: config.ingest_batch_size,
        })
    }

    /// The number of documents per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ingest all documents, batch by batch.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] for the first batch whose embedding
    /// or upsert fails, with the number of documents upserted before it.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestionSummary> {
        let mut summary = IngestionSummary::default();

        for (batch_index, batch) in documents.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let fail = |message: String| RagError::IngestionError {
                batch: batch_index,
                upserted: summary.documents,
                message,
            };

            let texts: Vec<&str> = batch.iter().map(|d| d.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(batch = batch_index, error = %e, "embedding failed during ingestion");
                fail(format!("embedding failed: {e}"))
            })?;

            if embeddings.len() != batch.len() {
                error!(batch = batch_index, expected = batch.len(), got = embeddings.len(), "embedding count mismatch");
                return Err(fail(format!(
                    "expected {} embeddings, provider returned {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .enumerate()
                .map(|(j, (document, values))| VectorRecord {
                    id: document_id(document, offset + j),
                    values,
                    metadata: record_metadata(document),
                })
                .collect();

            self.vector_store.upsert(&self.namespace, &records).await.map_err(|e| {
                error!(batch = batch_index, namespace = %self.namespace, error = %e, "upsert failed during ingestion");
                fail(format!("upsert failed: {e}"))
            })?;

            summary.documents += records.len();
            summary.batches += 1;
            info!(batch = batch_index, count = records.len(), "ingested batch");
        }

        info!(documents = summary.documents, batches = summary.batches, "ingestion completed");
        Ok(summary)
    }
}
