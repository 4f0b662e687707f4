//! # rag-context
//!
//! Retrieval-augmented context selection for LLM system prompts.
//!
//! Given the running conversation and a base system prompt, the engine embeds
//! the latest user message, retrieves candidate passages from a vector store,
//! reranks them, greedily packs the best ones under a quality floor and a
//! character budget, and appends them to the prompt as a delimited context
//! block. Any failure on that path falls back to the unmodified prompt.
//!
//! ## Components
//!
//! - [`EmbeddingProvider`]: text → vector ([`openai::OpenAIEmbeddingProvider`])
//! - [`VectorStore`]: namespaced similarity search and upsert
//!   ([`InMemoryVectorStore`], [`pinecone::PineconeVectorStore`], [`qdrant::QdrantVectorStore`])
//! - [`Reranker`]: [`LexicalReranker`] (BM25-style), [`LlmJudgeReranker`], [`NoOpReranker`]
//! - [`pack`]: greedy prefix selection into a [`PackedContext`]
//! - [`PromptAugmenter`]: the read path, returning an [`Enhancement`]
//! - [`IngestionPipeline`]: the write path, batching embed + upsert
//!
//! ## Feature flags
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `openai` | OpenAI embeddings and chat completions via `reqwest` |
//! | `pinecone` | Pinecone REST vector store via `reqwest` |
//! | `qdrant` | Qdrant vector store via `qdrant-client` |
//! | `full` | all of the above |

pub mod augmenter;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod ingestion;
pub mod judge;
pub mod lexical;
pub mod llm;
pub mod packer;
pub mod reranker;
pub mod telemetry;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pinecone")]
pub mod pinecone;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use augmenter::{Enhancement, PromptAugmenter, PromptAugmenterBuilder, format_enhanced_prompt};
pub use config::{RagConfig, RagConfigBuilder, RerankStrategy};
pub use document::{Document, Message, Metadata, RetrievedCandidate, Role, SearchMatch, VectorRecord};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use ingestion::{IngestionPipeline, IngestionSummary};
pub use judge::LlmJudgeReranker;
pub use lexical::{Bm25Params, LexicalReranker, bm25_score};
pub use llm::CompletionModel;
pub use packer::{PackedContext, pack};
pub use reranker::{NoOpReranker, Reranker, reranker_for};
pub use vectorstore::VectorStore;

#[cfg(feature = "openai")]
pub use openai::{OpenAICompletionModel, OpenAIEmbeddingProvider};
#[cfg(feature = "pinecone")]
pub use pinecone::PineconeVectorStore;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
