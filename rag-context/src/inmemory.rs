//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{SearchMatch, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine similarity for search.
///
/// Records are stored as nested `HashMap`s: namespace → record ID → record.
/// Namespaces are created on first upsert; searching a namespace that was
/// never written returns no matches.
///
/// # Example
///
/// ```rust,ignore
/// use rag_context::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert("coaching", &records).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, HashMap<String, VectorRecord>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in a namespace.
    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces.read().await.get(namespace).map_or(0, HashMap::len)
    }

    /// Whether a namespace holds no records.
    pub async fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace).await == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        if let Some(record) = records.iter().find(|r| r.values.is_empty()) {
            return Err(RagError::VectorStoreError {
                backend: "InMemory".to_string(),
                message: format!("record '{}' has no embedding values", record.id),
            });
        }
        let mut namespaces = self.namespaces.write().await;
        let store = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        debug!(namespace, count = records.len(), "upserted records in memory");
        Ok(())
    }

    async fn delete(&self, namespace: &str, ids: &[&str]) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        if let Some(store) = namespaces.get_mut(namespace) {
            for id in ids {
                store.remove(*id);
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(store) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<SearchMatch> = store
            .values()
            .map(|record| SearchMatch {
                id: record.id.clone(),
                score: cosine_similarity(&record.values, embedding),
                metadata: record.metadata.clone(),
            })
            .collect();

        // NaN similarities (from NaN components) rank last
        let key = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score + 0.0 };
        scored.sort_by(|a, b| key(b.score).total_cmp(&key(a.score)));
        scored.truncate(top_k);
        Ok(scored)
    }
}
