//! Greedy context-window packing.
//!
//! [`pack`] takes the reranked candidates and keeps the longest prefix that
//! clears the quality floor and fits the character budget. It stops at the
//! first candidate that fails either check; later candidates are never
//! considered, even if a shorter one would still fit.

use serde::Serialize;

use crate::document::RetrievedCandidate;

/// Default minimum relevance score for a candidate to be packed.
pub const DEFAULT_QUALITY_FLOOR: f64 = 5.0;
/// Default maximum total text length of the packed context, in characters.
pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 4000;

/// The candidates selected for the context block, in rank order.
///
/// `total_length` is the sum of the selected texts' lengths in characters and
/// never exceeds the budget the context was packed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackedContext {
    candidates: Vec<RetrievedCandidate>,
    total_length: usize,
}

impl PackedContext {
    /// The selected candidates in selection order.
    pub fn candidates(&self) -> &[RetrievedCandidate] {
        &self.candidates
    }

    /// Accumulated text length of the selected candidates, in characters.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of selected candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Render each candidate as `[Relevance: x.y]` followed by its text,
    /// separated by blank lines.
    pub fn format(&self) -> String {
        self.candidates
            .iter()
            .map(|c| format!("[Relevance: {}]\n{}", format_relevance(c.score), c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// `None` when nothing was selected.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Render a score with one decimal, rounding exact ties away from zero.
///
/// `{:.1}` already rounds on the exact binary value; it only differs on exact
/// halfway values (`x.25`, `x.75`), which it rounds to even.
fn format_relevance(score: f64) -> String {
    let quarters = score * 4.0;
    let is_tie = quarters.fract() == 0.0 && quarters % 2.0 != 0.0;
    let score = if is_tie { (score * 10.0).round() / 10.0 } else { score };
    format!("{score:.1}")
}

/// Select a prefix of `ranked` under `quality_floor` and `max_length`.
pub fn pack(
    ranked: impl IntoIterator<Item = RetrievedCandidate>,
    quality_floor: f64,
    max_length: usize,
) -> PackedContext {
    let mut packed = PackedContext::default();
    for candidate in ranked {
        if candidate.score.is_nan() || candidate.score < quality_floor {
            break;
        }
        let length = candidate.text.chars().count();
        if length > max_length - packed.total_length {
            break;
        }
        packed.total_length += length;
        packed.candidates.push(candidate);
    }
    packed
}
