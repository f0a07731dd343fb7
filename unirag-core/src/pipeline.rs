//! End-to-end RAG orchestration, timing, and source attribution (spec.md §4.8).

use std::sync::Arc;

use tracing::{error, info};

use crate::catalog::DocumentCatalog;
use crate::clock::Clock;
use crate::config::RagConfig;
use crate::document::{
    CategoryId, Document, Language, RAGResult, ResultMetadata, RouteMode, ScoredChunk, Timings,
    VectorIndex,
};
use crate::embedder::Embedder;
use crate::generator::{GenerationConfig, Generator};
use crate::prompt::PromptBuilder;
use crate::vectorstore::{self, ScoringMode, SearchFilter};

/// No-documents bilingual stub answer (spec.md §4.8 step 3, §7).
const NO_RESULTS_ANSWER: &str =
    "Вибачте, у базі документів немає релевантної інформації для цього запитання. / \
     Sorry, there are no relevant documents for this question.";

/// Bilingual failure notice returned in `error` mode (spec.md §7).
fn error_answer(detail: &str) -> String {
    format!(
        "Сталася помилка під час обробки запиту. / An error occurred while processing the request. ({detail})"
    )
}

/// Orchestrates a single grounded query end to end: embed, retrieve,
/// assemble prompt, generate, clean, attribute sources.
///
/// The public methods never throw — every path returns a tagged
/// [`RAGResult`] or [`crate::document::ScoredChunk`] list (spec.md §7,
/// "Runtime is caller-safe").
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    clock: Arc<dyn Clock>,
    prompt_builder: PromptBuilder,
}

impl RagPipeline {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let prompt_builder =
            PromptBuilder::new(config.context_max_tokens, config.prompt_reserve_tokens);
        Self { config, embedder, generator, clock, prompt_builder }
    }

    /// Run a single grounded query against `index`/`catalog`.
    ///
    /// Steps 1–9 of spec.md §4.8: embed → retrieve → (no-results short
    /// circuit) → build prompt → generate → extract → attribute sources →
    /// return, or convert any collaborator failure into `{mode: error}`.
    pub async fn answer(
        &self,
        index: &VectorIndex,
        catalog: &DocumentCatalog,
        query: &str,
        filter: &SearchFilter,
        generation_config: &GenerationConfig,
    ) -> RAGResult {
        match self.answer_inner(index, catalog, query, filter, generation_config).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "rag pipeline query failed");
                RAGResult {
                    mode: RouteMode::Error,
                    answer: error_answer(&e.to_string()),
                    retrieved_chunks: Vec::new(),
                    sources: Vec::new(),
                    metadata: ResultMetadata::default(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn answer_inner(
        &self,
        index: &VectorIndex,
        catalog: &DocumentCatalog,
        query: &str,
        filter: &SearchFilter,
        generation_config: &GenerationConfig,
    ) -> crate::error::Result<RAGResult> {
        let t0 = self.clock.now_ms();
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| crate::error::CoreError::PipelineError(format!("query embedding failed: {e}")))?;
        let t1 = self.clock.now_ms();

        let retrieved =
            vectorstore::search(index, &query_embedding, self.config.top_k, filter, ScoringMode::Dot)
                .map_err(|e| {
                    crate::error::CoreError::PipelineError(format!("retrieval failed: {e}"))
                })?;
        let t2 = self.clock.now_ms();

        if retrieved.is_empty() {
            return Ok(RAGResult {
                mode: RouteMode::NoResults,
                answer: NO_RESULTS_ANSWER.to_string(),
                retrieved_chunks: Vec::new(),
                sources: Vec::new(),
                metadata: ResultMetadata {
                    timings: Timings { embed_ms: t1 - t0, retrieve_ms: t2 - t1, generate_ms: 0 },
                    retrieved_count: 0,
                    source_count: 0,
                    avg_similarity: 0.0,
                },
                error: None,
            });
        }

        let prompt = self.prompt_builder.build_rag_prompt(&retrieved, query);

        let raw = self.generator.generate(&prompt, generation_config).await.map_err(|e| {
            crate::error::CoreError::PipelineError(format!("generation failed: {e}"))
        })?;
        let t3 = self.clock.now_ms();

        let answer = PromptBuilder::extract_response(&raw);
        let sources = self.attribute_sources(&retrieved, catalog);

        let avg_similarity =
            retrieved.iter().map(|c| c.score).sum::<f32>() / retrieved.len() as f32;

        info!(
            retrieved = retrieved.len(),
            sources = sources.len(),
            avg_similarity,
            "rag pipeline query completed"
        );

        let source_count = sources.len();
        Ok(RAGResult {
            mode: RouteMode::Rag,
            answer,
            retrieved_chunks: retrieved.clone(),
            sources,
            metadata: ResultMetadata {
                timings: Timings { embed_ms: t1 - t0, retrieve_ms: t2 - t1, generate_ms: t3 - t2 },
                retrieved_count: retrieved.len(),
                source_count,
                avg_similarity,
            },
            error: None,
        })
    }

    /// Walk `retrieved` in order, keeping the first occurrence of each
    /// `document_id`, and enrich with full [`Document`] fields from the
    /// catalog. Documents the catalog doesn't recognize are skipped.
    fn attribute_sources(
        &self,
        retrieved: &[ScoredChunk],
        catalog: &DocumentCatalog,
    ) -> Vec<Document> {
        let mut seen = std::collections::HashSet::new();
        let mut sources = Vec::new();
        for scored in retrieved {
            if seen.insert(scored.chunk.document_id.clone()) {
                if let Some(doc) = catalog.by_id(&scored.chunk.document_id) {
                    sources.push(doc.clone());
                }
            }
        }
        sources
    }

    /// Embed and retrieve only — no generation. Returns chunks plus their
    /// source documents, for a search-style UI affordance.
    pub async fn semantic_search(
        &self,
        index: &VectorIndex,
        catalog: &DocumentCatalog,
        query: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> crate::error::Result<(Vec<ScoredChunk>, Vec<Document>)> {
        let embedding = self.embedder.embed(query).await.map_err(|e| {
            crate::error::CoreError::PipelineError(format!("query embedding failed: {e}"))
        })?;
        let retrieved = vectorstore::search(index, &embedding, top_k, filter, ScoringMode::Dot)
            .map_err(|e| crate::error::CoreError::PipelineError(format!("search failed: {e}")))?;
        let sources = self.attribute_sources(&retrieved, catalog);
        Ok((retrieved, sources))
    }

    /// Find documents similar to `document_id`, using its first chunk's
    /// vector as a stand-in query. Searches `top_k * 3` candidates and
    /// returns at most `top_k` distinct documents, excluding the source
    /// document, in order of first occurrence.
    pub async fn find_similar_documents(
        &self,
        index: &VectorIndex,
        catalog: &DocumentCatalog,
        document_id: &str,
        top_k: usize,
    ) -> crate::error::Result<Vec<Document>> {
        let seed_chunk = index
            .chunks()
            .iter()
            .find(|c| c.document_id == document_id)
            .ok_or_else(|| {
                crate::error::CoreError::InvalidArgument(format!(
                    "document '{document_id}' has no chunks in the index"
                ))
            })?;

        let seed_index = index
            .chunks()
            .iter()
            .position(|c| c.chunk_id == seed_chunk.chunk_id)
            .expect("seed_chunk was found by iterating the same slice");
        let seed_vector = index.row(seed_index).to_vec();

        let candidates =
            vectorstore::search(index, &seed_vector, top_k * 3, &SearchFilter::default(), ScoringMode::Dot)?;

        let mut seen = std::collections::HashSet::new();
        seen.insert(document_id.to_string());
        let mut results = Vec::new();
        for scored in candidates {
            if results.len() >= top_k {
                break;
            }
            if seen.insert(scored.chunk.document_id.clone()) {
                if let Some(doc) = catalog.by_id(&scored.chunk.document_id) {
                    results.push(doc.clone());
                }
            }
        }
        Ok(results)
    }

    /// The bilingual category display name, delegating to the catalog.
    pub fn category_name(catalog: &DocumentCatalog, category: CategoryId, language: Language) -> String {
        catalog.category_name(category, language)
    }
}
