//! Prompt augmentation: the read path of the engine.
//!
//! The [`PromptAugmenter`] turns the latest user message into a packed context
//! block (embed → search → rerank → pack) and appends it to a system prompt.
//! Every failure on this path degrades to the unmodified prompt; the consumer
//! always gets a usable string back.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_context::{PromptAugmenter, RagConfig, InMemoryVectorStore};
//!
//! let augmenter = PromptAugmenter::builder()
//!     .config(RagConfig::from_env()?)
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let enhancement = augmenter.enhance(&messages, "You are a coach.").await;
//! let system_prompt = enhancement.prompt;
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{Message, RetrievedCandidate, Role};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::CompletionModel;
use crate::packer::{PackedContext, pack};
use crate::reranker::{Reranker, reranker_for};
use crate::vectorstore::VectorStore;

/// Heading placed between the base prompt and the packed context.
pub const CONTEXT_HEADER: &str = "Context information is below, ordered by relevance:";
/// Delimiter line around the packed context.
pub const CONTEXT_DELIMITER: &str = "---------------------";
/// Usage instructions placed after the packed context.
pub const CONTEXT_FOOTER: &str = "Use this context to inform your responses when relevant, \
but you can also draw from your general knowledge when needed.\n\
If using information from the context, indicate which parts you used.";

/// Append a formatted context block to `base_prompt`.
pub fn format_enhanced_prompt(base_prompt: &str, context: &PackedContext) -> String {
    format!(
        "{base_prompt}\n\n{CONTEXT_HEADER}\n{CONTEXT_DELIMITER}\n{}\n{CONTEXT_DELIMITER}\n{CONTEXT_FOOTER}",
        context.format()
    )
    .trim()
    .to_string()
}

/// The result of [`PromptAugmenter::enhance`].
#[derive(Debug)]
pub struct Enhancement {
    /// The prompt to use as the system instruction.
    pub prompt: String,
    /// The read-path failure that caused a fallback to the base prompt, if any.
    pub error: Option<RagError>,
}

impl Enhancement {
    fn unchanged(base_prompt: &str) -> Self {
        Self { prompt: base_prompt.to_string(), error: None }
    }
}

/// Orchestrates retrieval, reranking and packing for one query at a time.
///
/// Holds shared handles to its collaborators and no per-request state, so one
/// instance can serve concurrent requests. Construct one via
/// [`PromptAugmenter::builder()`].
pub struct PromptAugmenter {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
}

impl PromptAugmenter {
    /// Create a new [`PromptAugmenterBuilder`].
    pub fn builder() -> PromptAugmenterBuilder {
        PromptAugmenterBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Retrieve, rerank and pack context for `query`.
    ///
    /// Returns `Ok(None)` when the store has no matches, no match carries text,
    /// or nothing clears the quality floor and budget.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's error unchanged: [`RagError::EmbeddingError`],
    /// [`RagError::VectorStoreError`] or [`RagError::RerankerError`].
    pub async fn relevant_context(&self, query: &str) -> Result<Option<PackedContext>> {
        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let namespace = self.config.namespace.as_str();
        let matches = self
            .vector_store
            .search(namespace, &query_embedding, self.config.top_k)
            .await
            .inspect_err(|e| error!(namespace, error = %e, "vector store search failed"))?;

        if matches.is_empty() {
            info!(namespace, "no matches for query");
            return Ok(None);
        }

        let match_count = matches.len();
        let candidates: Vec<RetrievedCandidate> =
            matches.into_iter().filter_map(RetrievedCandidate::from_match).collect();

        let ranked = self
            .reranker
            .rerank(query, candidates)
            .await
            .inspect_err(|e| error!(error = %e, "reranking failed"))?;

        let packed = pack(ranked, self.config.quality_floor, self.config.max_context_length);
        info!(
            match_count,
            selected = packed.len(),
            total_length = packed.total_length(),
            "context packed"
        );

        Ok(packed.non_empty())
    }

    /// Append the relevant context for `query` to `base_prompt`.
    ///
    /// Returns `base_prompt` unchanged when there is no context.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`relevant_context`](Self::relevant_context).
    pub async fn enhance_system_prompt(&self, base_prompt: &str, query: &str) -> Result<String> {
        Ok(match self.relevant_context(query).await? {
            Some(context) => format_enhanced_prompt(base_prompt, &context),
            None => base_prompt.to_string(),
        })
    }

    /// Augment `base_prompt` with context for the latest user message in `history`.
    ///
    /// Never fails: without a user message, without context, or on any
    /// read-path error the base prompt is returned unchanged, with the error
    /// attached in the latter case. A panicking collaborator is reported as
    /// [`RagError::PipelineError`].
    pub async fn enhance(&self, history: &[Message], base_prompt: &str) -> Enhancement {
        let Some(last_user) = history.iter().rev().find(|m| m.role == Role::User) else {
            return Enhancement::unchanged(base_prompt);
        };

        let outcome = AssertUnwindSafe(self.enhance_system_prompt(base_prompt, &last_user.content))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RagError::PipelineError(panic_message(panic.as_ref()))));

        match outcome {
            Ok(prompt) => Enhancement { prompt, error: None },
            Err(e) => {
                warn!(error = %e, "context retrieval failed, using base prompt");
                Enhancement { prompt: base_prompt.to_string(), error: Some(e) }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("context retrieval panicked: {detail}")
}

/// Builder for constructing a [`PromptAugmenter`].
///
/// `embedding_provider` and `vector_store` are required. The reranker is taken
/// from [`reranker`](Self::reranker) if set, otherwise built from the
/// configured [`RerankStrategy`](crate::RerankStrategy) (which needs a
/// [`judge_model`](Self::judge_model) for `LlmJudge`).
#[derive(Default)]
pub struct PromptAugmenterBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    judge_model: Option<Arc<dyn CompletionModel>>,
}

impl PromptAugmenterBuilder {
    /// Set the configuration. Defaults to [`RagConfig::default()`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Use a specific reranker instead of the configured strategy.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the completion model used by the `LlmJudge` strategy.
    pub fn judge_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.judge_model = Some(model);
        self
    }

    /// Build the [`PromptAugmenter`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the configuration is invalid, a
    /// required collaborator is missing, or the strategy cannot be built.
    pub fn build(self) -> Result<PromptAugmenter> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let reranker = match self.reranker {
            Some(reranker) => reranker,
            None => reranker_for(config.rerank_strategy, self.judge_model)?,
        };

        Ok(PromptAugmenter { config, embedding_provider, vector_store, reranker })
    }
}
