//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rag_context::document::TEXT_KEY;
use rag_context::{
    CompletionModel, EmbeddingProvider, Metadata, RagError, Result, SearchMatch, VectorRecord,
    VectorStore,
};
use serde_json::json;

pub const DIM: usize = 8;

/// Deterministic bag-of-words embedder: each lowercase word bumps one bucket.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0; DIM];
        for word in text.split_whitespace() {
            let bucket = word.to_lowercase().bytes().map(usize::from).sum::<usize>() % DIM;
            v[bucket] += 1.0;
        }
        // keep every vector non-zero so cosine similarity is defined
        v[0] += 0.01;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Fails whenever the text contains `poison`.
pub struct PoisonEmbedder {
    pub poison: &'static str,
}

#[async_trait]
impl EmbeddingProvider for PoisonEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains(self.poison) {
            return Err(RagError::EmbeddingError {
                provider: "test".into(),
                message: "rate limited".into(),
            });
        }
        Ok(vec![1.0; DIM])
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Returns a fixed list of matches for every search; records upserts.
#[derive(Default)]
pub struct ScriptedStore {
    pub matches: Vec<SearchMatch>,
    pub searches: Mutex<Vec<(String, usize)>>,
    pub upserts: Mutex<Vec<Vec<VectorRecord>>>,
    /// Zero-based upsert call index that fails, if any.
    pub fail_upsert_at: Option<usize>,
}

impl ScriptedStore {
    pub fn with_matches(matches: Vec<SearchMatch>) -> Self {
        Self { matches, ..Self::default() }
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn upsert(&self, _namespace: &str, records: &[VectorRecord]) -> Result<()> {
        let mut upserts = self.upserts.lock().unwrap();
        if self.fail_upsert_at == Some(upserts.len()) {
            return Err(RagError::VectorStoreError {
                backend: "scripted".into(),
                message: "index unavailable".into(),
            });
        }
        upserts.push(records.to_vec());
        Ok(())
    }

    async fn delete(&self, _namespace: &str, _ids: &[&str]) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        _embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        self.searches.lock().unwrap().push((namespace.to_string(), top_k));
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// A store that is always unreachable.
pub struct DownStore;

#[async_trait]
impl VectorStore for DownStore {
    async fn upsert(&self, _namespace: &str, _records: &[VectorRecord]) -> Result<()> {
        Err(down())
    }

    async fn delete(&self, _namespace: &str, _ids: &[&str]) -> Result<()> {
        Err(down())
    }

    async fn search(&self, _: &str, _: &[f32], _: usize) -> Result<Vec<SearchMatch>> {
        Err(down())
    }
}

fn down() -> RagError {
    RagError::VectorStoreError { backend: "down".into(), message: "connection refused".into() }
}

/// A store whose search panics.
pub struct PanickingStore;

#[async_trait]
impl VectorStore for PanickingStore {
    async fn upsert(&self, _namespace: &str, _records: &[VectorRecord]) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _namespace: &str, _ids: &[&str]) -> Result<()> {
        Ok(())
    }

    async fn search(&self, _: &str, _: &[f32], _: usize) -> Result<Vec<SearchMatch>> {
        panic!("index shard missing");
    }
}

/// Replies with a scripted answer per passage (matched by substring), or fails.
pub struct ScriptedJudge {
    pub replies: HashMap<&'static str, std::result::Result<&'static str, &'static str>>,
    pub calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn new(
        replies: impl IntoIterator<Item = (&'static str, std::result::Result<&'static str, &'static str>)>,
    ) -> Self {
        Self { replies: replies.into_iter().collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl CompletionModel for ScriptedJudge {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let passage = prompt.rsplit("Passage: ").next().unwrap_or_default();
        match self.replies.iter().find(|(key, _)| passage.contains(**key)) {
            Some((_, Ok(reply))) => Ok((*reply).to_string()),
            Some((_, Err(message))) => Err(RagError::RerankerError {
                reranker: "scripted".into(),
                message: (*message).to_string(),
            }),
            None => Ok("0".to_string()),
        }
    }

    fn name(&self) -> &str {
        "scripted-judge"
    }
}

pub fn text_match(id: &str, text: &str, score: f32) -> SearchMatch {
    SearchMatch { id: id.into(), score, metadata: Metadata::from([(TEXT_KEY.to_string(), json!(text))]) }
}
