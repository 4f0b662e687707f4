//! LLM-judge reranking.
//!
//! Each candidate is rated 0–10 for relevance by one completion call. All calls
//! for a query run concurrently and are joined before sorting, so latency is
//! one model round trip while cost grows linearly with the candidate count.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::document::RetrievedCandidate;
use crate::error::Result;
use crate::llm::CompletionModel;
use crate::reranker::{Reranker, sort_by_score_desc};

/// Build the rating prompt for one (query, passage) pair.
pub fn judge_prompt(query: &str, passage: &str) -> String {
    format!(
        "Rate how relevant the passage is to the query on a scale from 0 to 10, \
         where 0 means unrelated and 10 means it directly answers the query.\n\
         Respond with the number only.\n\n\
         Query: {query}\n\n\
         Passage: {passage}"
    )
}

/// Parse a model reply as a rating. Anything that is not a finite number is 0.
pub fn parse_rating(reply: &str) -> f64 {
    try_parse_rating(reply).unwrap_or(0.0)
}

fn try_parse_rating(reply: &str) -> Option<f64> {
    reply.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A [`Reranker`] that asks a [`CompletionModel`] to rate each candidate.
///
/// A failed call or unparseable reply scores the candidate 0; it never fails
/// the rerank as a whole.
pub struct LlmJudgeReranker {
    model: Arc<dyn CompletionModel>,
}

impl LlmJudgeReranker {
    /// Create a judge reranker backed by the given model.
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    async fn rate(&self, query: &str, passage: &str) -> f64 {
        match self.model.complete(&judge_prompt(query, passage)).await {
            Ok(reply) => try_parse_rating(&reply).unwrap_or_else(|| {
                warn!(model = self.model.name(), reply = %reply.trim(), "unparseable relevance rating, scoring 0");
                0.0
            }),
            Err(e) => {
                warn!(model = self.model.name(), error = %e, "relevance judge call failed, scoring 0");
                0.0
            }
        }
    }
}

#[async_trait]
impl Reranker for LlmJudgeReranker {
    async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<RetrievedCandidate>,
    ) -> Result<Vec<RetrievedCandidate>> {
        let ratings = join_all(candidates.iter().map(|c| self.rate(query, &c.text))).await;
        for (candidate, rating) in candidates.iter_mut().zip(ratings) {
            candidate.score = rating;
        }
        sort_by_score_desc(&mut candidates);
        debug!(reranker = "llm_judge", model = self.model.name(), count = candidates.len(), "reranked candidates");
        Ok(candidates)
    }
}
