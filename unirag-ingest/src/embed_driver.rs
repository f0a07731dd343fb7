//! Drives chunks through an [`Embedder`] in politeness-paced batches and
//! assembles the `embeddings.json` artifact.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use unirag_core::artifacts::{ChunkConfig, EmbeddingsFile};
use unirag_core::document::{Chunk, EmbeddedChunk};
use unirag_core::embedder::Embedder;

use crate::error::Result;

/// Embed every chunk in `chunks`, `batch_size` at a time, pausing
/// `batch_pause_ms` between batches.
///
/// A chunk whose embedding call fails is dropped with a warning rather
/// than aborting the run — a single bad chunk should not cost the whole
/// index.
pub async fn embed_all(
    embedder: Arc<dyn Embedder>,
    chunks: Vec<Chunk>,
    batch_size: usize,
    batch_pause_ms: u64,
) -> Result<Vec<EmbeddedChunk>> {
    let mut embedded = Vec::with_capacity(chunks.len());

    for (batch_index, batch) in chunks.chunks(batch_size.max(1)).enumerate() {
        if batch_index > 0 {
            sleep(Duration::from_millis(batch_pause_ms)).await;
        }

        for chunk in batch {
            match embedder.embed(&chunk.text).await {
                Ok(embedding) => {
                    if embedding.len() != embedder.dimensions() {
                        warn!(
                            chunk_id = %chunk.chunk_id,
                            expected = embedder.dimensions(),
                            got = embedding.len(),
                            "embedder returned a vector of unexpected dimension, skipping chunk"
                        );
                        continue;
                    }
                    embedded.push(EmbeddedChunk { chunk: chunk.clone(), embedding });
                }
                Err(e) => {
                    warn!(chunk_id = %chunk.chunk_id, error = %e, "embedding failed, skipping chunk");
                }
            }
        }

        info!(batch = batch_index, embedded_so_far = embedded.len(), "embedding batch complete");
    }

    Ok(embedded)
}

/// Assemble the `embeddings.json` artifact from already-embedded chunks.
pub fn build_embeddings_file(
    embedded: Vec<EmbeddedChunk>,
    model: &str,
    config: ChunkConfig,
    generated_at: &str,
) -> EmbeddingsFile {
    let embedding_dim = embedded.first().map(|c| c.embedding.len()).unwrap_or(0);
    EmbeddingsFile {
        version: "1".to_string(),
        generated_at: generated_at.to_string(),
        model: model.to_string(),
        embedding_dim,
        total_chunks: embedded.len(),
        config,
        chunks: embedded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unirag_core::document::{CategoryId, ChunkMetadata, Language};
    use unirag_core::testutil::{FailingEmbedder, FakeEmbedder};

    fn chunk(id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            document_id: "doc_1".to_string(),
            text: format!("text of {id}"),
            tokens: 10,
            chunk_index: 0,
            category: CategoryId::Safety,
            language: Language::En,
            metadata: ChunkMetadata {
                document_title: "Title".to_string(),
                document_filename: "f.pdf".to_string(),
                source_url: "https://example.test/f.pdf".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn embeds_every_chunk_across_multiple_batches() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let chunks = vec![chunk("c0"), chunk("c1"), chunk("c2"), chunk("c3"), chunk("c4")];
        let embedded = embed_all(embedder, chunks, 2, 0).await.unwrap();
        assert_eq!(embedded.len(), 5);
        for e in &embedded {
            assert_eq!(e.embedding.len(), 4);
        }
    }

    #[tokio::test]
    async fn failing_embedder_drops_chunks_instead_of_aborting() {
        let embedder = Arc::new(FailingEmbedder { dim: 4 });
        let chunks = vec![chunk("c0"), chunk("c1")];
        let embedded = embed_all(embedder, chunks, 10, 0).await.unwrap();
        assert!(embedded.is_empty());
    }

    #[test]
    fn build_embeddings_file_infers_dimension_from_first_chunk() {
        let embedded = vec![EmbeddedChunk { chunk: chunk("c0"), embedding: vec![1.0, 0.0, 0.0] }];
        let file = build_embeddings_file(
            embedded,
            "test-model",
            ChunkConfig { target_tokens: 250, overlap_tokens: 50, min_chunk_tokens: 100 },
            "2026-01-01T00:00:00Z",
        );
        assert_eq!(file.embedding_dim, 3);
        assert_eq!(file.total_chunks, 1);
    }

    #[test]
    fn build_embeddings_file_of_empty_input_has_zero_dimension() {
        let file = build_embeddings_file(
            vec![],
            "test-model",
            ChunkConfig { target_tokens: 250, overlap_tokens: 50, min_chunk_tokens: 100 },
            "2026-01-01T00:00:00Z",
        );
        assert_eq!(file.embedding_dim, 0);
        assert_eq!(file.total_chunks, 0);
    }
}
