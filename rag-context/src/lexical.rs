//! BM25-style lexical reranking.
//!
//! Scores each candidate against the query with the saturating term-frequency
//! and length-normalization formula of BM25, using a fixed average document
//! length instead of corpus statistics. The IDF factor is the per-document
//! proxy `ln(1 + 1/tf)`; no cross-document frequencies are involved, so a
//! candidate's score depends only on its own text and the query.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::document::RetrievedCandidate;
use crate::error::Result;
use crate::reranker::{Reranker, sort_by_score_desc};

/// Term-frequency saturation constant.
pub const DEFAULT_K1: f64 = 1.5;
/// Length-normalization constant.
pub const DEFAULT_B: f64 = 0.75;
/// Assumed average document length in tokens.
pub const DEFAULT_AVG_DOC_LENGTH: f64 = 500.0;

/// Parameters of the lexical scoring formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Saturation constant.
    pub k1: f64,
    /// Length-normalization constant.
    pub b: f64,
    /// Fixed average document length, in tokens.
    pub avg_doc_length: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B, avg_doc_length: DEFAULT_AVG_DOC_LENGTH }
    }
}

/// Lowercase and split on whitespace.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Score `doc` against `query`.
///
/// Every query token (repeats included) that occurs in the document adds
/// `idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * doc_len / avg_len))`
/// with `idf = ln(1 + 1/tf)`. Tokens absent from the document add nothing.
pub fn bm25_score(doc: &str, query: &str, params: &Bm25Params) -> f64 {
    let doc_terms = tokenize(doc);
    let doc_length = doc_terms.len() as f64;

    let mut term_frequencies: HashMap<&str, u32> = HashMap::with_capacity(doc_terms.len());
    for term in &doc_terms {
        *term_frequencies.entry(term.as_str()).or_insert(0) += 1;
    }

    let length_norm = 1.0 - params.b + params.b * (doc_length / params.avg_doc_length);

    tokenize(query)
        .iter()
        .filter_map(|term| term_frequencies.get(term.as_str()))
        .map(|&count| {
            let tf = count as f64;
            let idf = (1.0 + 1.0 / tf).ln();
            idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * length_norm)
        })
        .sum()
}

/// A [`Reranker`] that replaces scores with [`bm25_score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalReranker {
    params: Bm25Params,
}

impl LexicalReranker {
    /// Create a lexical reranker with custom parameters.
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }

    /// The scoring parameters.
    pub fn params(&self) -> &Bm25Params {
        &self.params
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<RetrievedCandidate>,
    ) -> Result<Vec<RetrievedCandidate>> {
        for candidate in &mut candidates {
            candidate.score = bm25_score(&candidate.text, query, &self.params);
        }
        sort_by_score_desc(&mut candidates);
        debug!(reranker = "lexical", count = candidates.len(), "reranked candidates");
        Ok(candidates)
    }
}
