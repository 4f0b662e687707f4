//! Configuration for context retrieval and ingestion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::packer::{DEFAULT_MAX_CONTEXT_LENGTH, DEFAULT_QUALITY_FLOOR};

/// Default ingestion batch size, sized for upstream rate limits.
pub const DEFAULT_INGEST_BATCH_SIZE: usize = 100;

/// Which [`Reranker`](crate::Reranker) reorders retrieved candidates.
///
/// The quality floor is compared against whatever scale the active strategy
/// produces: cosine similarity for `None`, an unbounded BM25 sum for `Lexical`,
/// a 0–10 rating for `LlmJudge`. Calibrate it per strategy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RerankStrategy {
    /// Keep the vector store order and similarity scores. Pair with `top_k = 3`.
    None,
    /// BM25-style term-frequency scoring.
    #[default]
    Lexical,
    /// One 0–10 relevance rating per candidate from a completion model.
    LlmJudge,
}

impl fmt::Display for RerankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Lexical => "lexical",
            Self::LlmJudge => "llm_judge",
        };
        f.write_str(name)
    }
}

impl FromStr for RerankStrategy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lexical" | "bm25" => Ok(Self::Lexical),
            "llm_judge" | "llm" => Ok(Self::LlmJudge),
            other => Err(RagError::ConfigError(format!("unknown rerank strategy '{other}'"))),
        }
    }
}

/// Configuration parameters for retrieval, packing and ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Vector store index (collection) name.
    pub index_name: String,
    /// Namespace within the index that queries and ingestion use.
    pub namespace: String,
    /// Number of raw candidates requested from the vector store.
    pub top_k: usize,
    /// Minimum reranked score for a candidate to enter the context block.
    pub quality_floor: f64,
    /// Maximum total length of packed candidate texts, in characters.
    pub max_context_length: usize,
    /// Reranking strategy.
    pub rerank_strategy: RerankStrategy,
    /// Documents per embedding/upsert batch during ingestion.
    pub ingest_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_name: "default-index".to_string(),
            namespace: "default-namespace".to_string(),
            top_k: 5,
            quality_floor: DEFAULT_QUALITY_FLOOR,
            max_context_length: DEFAULT_MAX_CONTEXT_LENGTH,
            rerank_strategy: RerankStrategy::Lexical,
            ingest_batch_size: DEFAULT_INGEST_BATCH_SIZE,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from the defaults overlaid with environment variables.
    ///
    /// Reads `PINECONE_INDEX_NAME`, `PINECONE_NAMESPACE`, `RAG_TOP_K`,
    /// `RAG_QUALITY_FLOOR`, `RAG_MAX_CONTEXT_LENGTH`, `RAG_RERANK_STRATEGY` and
    /// `RAG_INGEST_BATCH_SIZE`. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a variable cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(name) = lookup("PINECONE_INDEX_NAME") {
            builder = builder.index_name(name);
        }
        if let Some(namespace) = lookup("PINECONE_NAMESPACE") {
            builder = builder.namespace(namespace);
        }
        if let Some(top_k) = lookup("RAG_TOP_K") {
            builder = builder.top_k(parse_var("RAG_TOP_K", &top_k)?);
        }
        if let Some(floor) = lookup("RAG_QUALITY_FLOOR") {
            builder = builder.quality_floor(parse_var("RAG_QUALITY_FLOOR", &floor)?);
        }
        if let Some(max) = lookup("RAG_MAX_CONTEXT_LENGTH") {
            builder = builder.max_context_length(parse_var("RAG_MAX_CONTEXT_LENGTH", &max)?);
        }
        if let Some(strategy) = lookup("RAG_RERANK_STRATEGY") {
            builder = builder.rerank_strategy(strategy.parse()?);
        }
        if let Some(size) = lookup("RAG_INGEST_BATCH_SIZE") {
            builder = builder.ingest_batch_size(parse_var("RAG_INGEST_BATCH_SIZE", &size)?);
        }
        builder.build()
    }

    /// Check that the parameters are usable.
    ///
    /// Deserialized configurations bypass the builder, so consumers call this
    /// before using one.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `top_k == 0`
    /// - `ingest_batch_size == 0`
    /// - `max_context_length == 0`
    /// - `quality_floor` is not finite
    /// - `index_name` or `namespace` is empty
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.ingest_batch_size == 0 {
            return Err(RagError::ConfigError(
                "ingest_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_context_length == 0 {
            return Err(RagError::ConfigError(
                "max_context_length must be greater than zero".to_string(),
            ));
        }
        if !self.quality_floor.is_finite() {
            return Err(RagError::ConfigError(format!(
                "quality_floor ({}) must be a finite number",
                self.quality_floor
            )));
        }
        if self.index_name.trim().is_empty() {
            return Err(RagError::ConfigError("index_name must not be empty".to_string()));
        }
        if self.namespace.trim().is_empty() {
            return Err(RagError::ConfigError("namespace must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RagError::ConfigError(format!("invalid value '{value}' for {key}: {e}")))
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the vector store index name.
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the number of raw candidates to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum reranked score for packing.
    pub fn quality_floor(mut self, floor: f64) -> Self {
        self.config.quality_floor = floor;
        self
    }

    /// Set the context length budget in characters.
    pub fn max_context_length(mut self, max: usize) -> Self {
        self.config.max_context_length = max;
        self
    }

    /// Set the reranking strategy.
    pub fn rerank_strategy(mut self, strategy: RerankStrategy) -> Self {
        self.config.rerank_strategy = strategy;
        self
    }

    /// Set the ingestion batch size.
    pub fn ingest_batch_size(mut self, size: usize) -> Self {
        self.config.ingest_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
