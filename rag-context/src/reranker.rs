//! Reranker trait for re-scoring retrieved candidates.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RerankStrategy;
use crate::document::RetrievedCandidate;
use crate::error::{RagError, Result};
use crate::judge::LlmJudgeReranker;
use crate::lexical::LexicalReranker;
use crate::llm::CompletionModel;

/// A reranker that re-scores and reorders retrieved candidates.
///
/// Implementations overwrite each candidate's `score` with their own relevance
/// metric and return the candidates sorted by it, highest first. Candidates
/// with equal scores keep their incoming relative order.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank candidates against the original query.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievedCandidate>,
    ) -> Result<Vec<RetrievedCandidate>>;
}

/// A no-op reranker that returns candidates unchanged.
///
/// Used for [`RerankStrategy::None`], where the store similarity is the final score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: Vec<RetrievedCandidate>,
    ) -> Result<Vec<RetrievedCandidate>> {
        Ok(candidates)
    }
}

/// Stable descending sort by score. NaN scores sort last.
pub(crate) fn sort_by_score_desc(candidates: &mut [RetrievedCandidate]) {
    candidates.sort_by(|a, b| sort_key(b.score).total_cmp(&sort_key(a.score)));
}

// `+ 0.0` folds -0.0 into 0.0 so the two stay tied.
fn sort_key(score: f64) -> f64 {
    if score.is_nan() { f64::NEG_INFINITY } else { score + 0.0 }
}

/// Build the reranker for a configured strategy.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if [`RerankStrategy::LlmJudge`] is
/// selected without a judge model.
pub fn reranker_for(
    strategy: RerankStrategy,
    judge: Option<Arc<dyn CompletionModel>>,
) -> Result<Arc<dyn Reranker>> {
    match strategy {
        RerankStrategy::None => Ok(Arc::new(NoOpReranker)),
        RerankStrategy::Lexical => Ok(Arc::new(LexicalReranker::default())),
        RerankStrategy::LlmJudge => {
            let model = judge.ok_or_else(|| {
                RagError::ConfigError("llm_judge strategy requires a completion model".to_string())
            })?;
            Ok(Arc::new(LlmJudgeReranker::new(model)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_passes_candidates_through() {
        let candidates =
            vec![RetrievedCandidate::new("a", 0.2), RetrievedCandidate::new("b", 0.9)];
        let out = NoOpReranker.rerank("q", candidates.clone()).await.unwrap();
        assert_eq!(out, candidates);
    }

    #[test]
    fn sort_keeps_ties_in_order() {
        let mut candidates = vec![
            RetrievedCandidate::new("first", 1.0),
            RetrievedCandidate::new("top", 3.0),
            RetrievedCandidate::new("second", 1.0),
        ];
        sort_by_score_desc(&mut candidates);
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["top", "first", "second"]);
    }

    #[test]
    fn sort_puts_nan_scores_last() {
        let mut candidates = vec![
            RetrievedCandidate::new("broken", f64::NAN),
            RetrievedCandidate::new("low", 1.0),
            RetrievedCandidate::new("high", 3.0),
            RetrievedCandidate::new("zero", -0.0),
            RetrievedCandidate::new("also zero", 0.0),
        ];
        sort_by_score_desc(&mut candidates);
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["high", "low", "zero", "also zero", "broken"]);
    }

    #[test]
    fn judge_strategy_without_model_is_config_error() {
        let err = reranker_for(RerankStrategy::LlmJudge, None).err().unwrap();
        assert!(matches!(err, RagError::ConfigError(_)));
    }
}
