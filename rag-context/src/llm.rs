//! Completion model trait used by the LLM-judge reranker.

use async_trait::async_trait;

use crate::error::Result;

/// A text-in, text-out language model call.
///
/// Implementations must sample deterministically (temperature 0) so that the
/// same prompt yields the same rating.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a single user prompt and return the model's reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// The model identifier, used in logs.
    fn name(&self) -> &str;
}
