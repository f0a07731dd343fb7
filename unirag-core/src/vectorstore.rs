//! Exact top-K similarity search over a loaded [`VectorIndex`] (spec.md §4.5).

use serde::{Deserialize, Serialize};

use crate::document::{CategoryId, Language, ScoredChunk, VectorIndex};
use crate::error::{CoreError, Result};

/// How a query vector is scored against stored vectors.
///
/// Both modes coincide when stored and query vectors are unit-norm, which
/// is an invariant the loader enforces at rest — but the query vector's
/// norm is only ever *expected*, not re-validated per call (spec.md §4.5
/// precondition), so the two modes are kept distinct rather than collapsed
/// into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    #[default]
    Dot,
    Cosine,
}

/// Optional metadata filter for [`search`]. A chunk is a candidate iff
/// every supplied field matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl SearchFilter {
    fn matches(&self, chunk: &crate::document::Chunk) -> bool {
        if let Some(category) = self.category {
            if chunk.category != category {
                return false;
            }
        }
        if let Some(language) = self.language {
            if chunk.language != language {
                return false;
            }
        }
        if let Some(document_id) = &self.document_id {
            if &chunk.document_id != document_id {
                return false;
            }
        }
        true
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Search `index` for the `top_k` chunks most similar to `query`, subject
/// to `filter`.
///
/// Exact O(N·D) scan, O(1) extra memory beyond the output — no ANN
/// structure, by design: determinism is required (spec.md §4.5, §8).
/// Ties are broken by storage order (earlier-stored chunk wins).
///
/// # Errors
///
/// Returns [`CoreError::DimensionMismatch`] if `query.len() != index.dim()`,
/// or [`CoreError::InvalidArgument`] if `top_k == 0`. An empty candidate
/// set (e.g. a filter that matches nothing) is not an error — it returns
/// an empty `Vec`.
pub fn search(
    index: &VectorIndex,
    query: &[f32],
    top_k: usize,
    filter: &SearchFilter,
    mode: ScoringMode,
) -> Result<Vec<ScoredChunk>> {
    if query.len() != index.dim() {
        return Err(CoreError::DimensionMismatch { expected: index.dim(), actual: query.len() });
    }
    if top_k == 0 {
        return Err(CoreError::InvalidArgument("top_k must be greater than zero".into()));
    }

    let score_fn: fn(&[f32], &[f32]) -> f32 = match mode {
        ScoringMode::Dot => dot,
        ScoringMode::Cosine => cosine,
    };

    let mut scored: Vec<(usize, f32)> = index
        .chunks()
        .iter()
        .enumerate()
        .filter(|(_, chunk)| filter.matches(chunk))
        .map(|(i, _)| (i, score_fn(index.row(i), query)))
        .collect();

    // Stable sort keeps ties in storage order; reverse partial_cmp gives
    // descending score order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    Ok(scored
        .into_iter()
        .map(|(i, score)| ScoredChunk { chunk: index.chunks()[i].clone(), score })
        .collect())
}
