//! Decides between grounded and free-chat modes per query (spec.md §4.6).

use std::sync::Arc;

use tracing::warn;

use crate::document::{RouteMode, RoutingDecision, ScoredChunk, VectorIndex};
use crate::embedder::Embedder;
use crate::vectorstore::{self, ScoringMode, SearchFilter};

/// Caller override for [`QueryRouter::route`]. When set, the router skips
/// embedding/search entirely and returns the forced mode with confidence 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedMode {
    Rag,
    General,
}

/// Decides, per query, whether to answer from retrieved documents or via
/// free chat, based on the top-1 similarity score.
///
/// Embeds the query and searches directly rather than going through
/// [`crate::pipeline::RagPipeline`] (Design Notes, spec.md §9) — the two
/// duplicate the first two steps of retrieval but diverge on error
/// handling: the router downgrades every failure to `general`, while the
/// pipeline surfaces every failure as `error`.
pub struct QueryRouter {
    embedder: Arc<dyn Embedder>,
    threshold_high: f32,
    threshold_low: f32,
}

impl QueryRouter {
    /// Construct a router. Thresholds are tunable at construction time and
    /// changing them must not alter any other component's behavior
    /// (spec.md §4.6).
    pub fn new(embedder: Arc<dyn Embedder>, threshold_low: f32, threshold_high: f32) -> Self {
        Self { embedder, threshold_low, threshold_high }
    }

    /// Route a query, optionally under a caller-forced mode.
    pub async fn route(
        &self,
        index: &VectorIndex,
        query: &str,
        forced: Option<ForcedMode>,
    ) -> RoutingDecision {
        if let Some(forced) = forced {
            let mode = match forced {
                ForcedMode::Rag => RouteMode::Rag,
                ForcedMode::General => RouteMode::General,
            };
            return RoutingDecision {
                mode,
                confidence: 1.0,
                reason: "caller forced mode".to_string(),
                top_chunks: Vec::new(),
            };
        }

        if index.is_empty() {
            return RoutingDecision {
                mode: RouteMode::General,
                confidence: 1.0,
                reason: "index is empty".to_string(),
                top_chunks: Vec::new(),
            };
        }

        let top = match self.retrieve_top1(index, query).await {
            Ok(top) => top,
            Err(e) => {
                warn!(error = %e, "router downgrading to general after retrieval failure");
                return RoutingDecision {
                    mode: RouteMode::General,
                    confidence: 0.5,
                    reason: format!("retrieval error: {e}"),
                    top_chunks: Vec::new(),
                };
            }
        };

        let Some(top) = top else {
            return RoutingDecision {
                mode: RouteMode::General,
                confidence: 1.0,
                reason: "no candidates".to_string(),
                top_chunks: Vec::new(),
            };
        };

        let score = top.score;
        if score >= self.threshold_high {
            RoutingDecision {
                mode: RouteMode::Rag,
                confidence: score,
                reason: format!("top score {score} >= high threshold {}", self.threshold_high),
                top_chunks: vec![top],
            }
        } else if score >= self.threshold_low {
            RoutingDecision {
                mode: RouteMode::General,
                confidence: 1.0 - score,
                reason: format!(
                    "top score {score} between low {} and high {}",
                    self.threshold_low, self.threshold_high
                ),
                top_chunks: vec![top],
            }
        } else {
            RoutingDecision {
                mode: RouteMode::General,
                confidence: 1.0,
                reason: format!("top score {score} < low threshold {}", self.threshold_low),
                top_chunks: Vec::new(),
            }
        }
    }

    /// Embed `query` and search the index for the single best match, with
    /// no filters. Shared with [`crate::pipeline::RagPipeline`] to avoid
    /// duplicating the embed+search call, but each caller decides for
    /// itself how to react to an `Err`.
    async fn retrieve_top1(
        &self,
        index: &VectorIndex,
        query: &str,
    ) -> crate::error::Result<Option<ScoredChunk>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| crate::error::CoreError::EmbedderUnavailable(e.to_string()))?;
        let mut results =
            vectorstore::search(index, &embedding, 1, &SearchFilter::default(), ScoringMode::Dot)?;
        Ok(if results.is_empty() { None } else { Some(results.remove(0)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{test_helpers, CategoryId, VectorIndex};
    use crate::testutil::{FailingEmbedder, FakeEmbedder};

    fn index_with_one_chunk(vector: Vec<f32>) -> VectorIndex {
        let dim = vector.len();
        VectorIndex::from_pairs(dim, vec![(test_helpers::chunk("doc_a", 0, CategoryId::Safety), vector)])
    }

    #[tokio::test]
    async fn forced_mode_skips_retrieval_entirely() {
        let embedder = Arc::new(FailingEmbedder { dim: 4 });
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = index_with_one_chunk(vec![1.0, 0.0, 0.0, 0.0]);
        let decision = router.route(&index, "anything", Some(ForcedMode::Rag)).await;
        assert_eq!(decision.mode, RouteMode::Rag);
        assert_eq!(decision.confidence, 1.0);
    }

    #[tokio::test]
    async fn empty_index_always_routes_general() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = VectorIndex::from_pairs(4, Vec::new());
        let decision = router.route(&index, "query", None).await;
        assert_eq!(decision.mode, RouteMode::General);
        assert_eq!(decision.confidence, 1.0);
    }

    #[tokio::test]
    async fn high_score_routes_rag_with_confidence_equal_to_score() {
        let embedder = Arc::new(FakeEmbedder::new(4).with_vector("q", vec![1.0, 0.0, 0.0, 0.0]));
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = index_with_one_chunk(vec![1.0, 0.0, 0.0, 0.0]);
        let decision = router.route(&index, "q", None).await;
        assert_eq!(decision.mode, RouteMode::Rag);
        assert!((decision.confidence - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn mid_score_downgrades_to_general_with_complement_confidence() {
        let embedder = Arc::new(FakeEmbedder::new(4).with_vector("q", vec![0.55, 0.0, 0.0, 0.0]));
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = index_with_one_chunk(vec![1.0, 0.0, 0.0, 0.0]);
        let decision = router.route(&index, "q", None).await;
        assert_eq!(decision.mode, RouteMode::General);
        assert!((decision.confidence - 0.45).abs() < 1e-6);
        assert!(!decision.top_chunks.is_empty());
    }

    #[tokio::test]
    async fn low_score_routes_general_with_no_chunks() {
        let embedder = Arc::new(FakeEmbedder::new(4).with_vector("q", vec![0.1, 0.0, 0.0, 0.0]));
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = index_with_one_chunk(vec![1.0, 0.0, 0.0, 0.0]);
        let decision = router.route(&index, "q", None).await;
        assert_eq!(decision.mode, RouteMode::General);
        assert!((decision.confidence - 1.0).abs() < 1e-6);
        assert!(decision.top_chunks.is_empty());
    }

    #[tokio::test]
    async fn embedder_failure_downgrades_to_general_with_half_confidence() {
        let embedder = Arc::new(FailingEmbedder { dim: 4 });
        let router = QueryRouter::new(embedder, 0.4, 0.6);
        let index = index_with_one_chunk(vec![1.0, 0.0, 0.0, 0.0]);
        let decision = router.route(&index, "q", None).await;
        assert_eq!(decision.mode, RouteMode::General);
        assert!((decision.confidence - 0.5).abs() < 1e-6);
    }
}
