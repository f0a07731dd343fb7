//! Loads and validates the gzip-compressed vector index (spec.md §4.5).

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use tracing::{info, warn};

use crate::artifacts::EmbeddingsFile;
use crate::blobfetcher::BlobFetcher;
use crate::document::VectorIndex;
use crate::error::{CoreError, Result};

/// L2-norm tolerance for the normalization assertion (spec.md §3 invariants).
const NORM_EPSILON: f32 = 1e-3;

/// Fetches, decompresses, validates, and hoists the embeddings artifact
/// into a runtime [`VectorIndex`].
///
/// This is the one runtime component allowed to raise a fatal error
/// (spec.md §7): every failure here is [`CoreError::IndexCorrupt`], and it
/// only ever runs once, at startup.
pub struct IndexLoader {
    fetcher: Arc<dyn BlobFetcher>,
}

impl IndexLoader {
    pub fn new(fetcher: Arc<dyn BlobFetcher>) -> Self {
        Self { fetcher }
    }

    /// Load the vector index from `path` (a gzip-compressed `embeddings.json.gz`
    /// blob, per spec.md §6 artifact 3).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexCorrupt`] if the blob cannot be fetched,
    /// decompressed, parsed as JSON, or fails structural validation.
    pub async fn load(&self, path: &str) -> Result<VectorIndex> {
        let compressed = self
            .fetcher
            .fetch(path)
            .await
            .map_err(|e| CoreError::IndexCorrupt(format!("failed to fetch '{path}': {e}")))?;

        let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
        let mut json_bytes = Vec::new();
        decoder
            .read_to_end(&mut json_bytes)
            .map_err(|e| CoreError::IndexCorrupt(format!("failed to decompress index: {e}")))?;

        let file: EmbeddingsFile = serde_json::from_slice(&json_bytes)
            .map_err(|e| CoreError::IndexCorrupt(format!("failed to parse index JSON: {e}")))?;

        self.build(file)
    }

    /// Parse an already-decompressed embeddings JSON document. Exposed
    /// separately from [`IndexLoader::load`] so tests (and embedded
    /// deployments that bundle the uncompressed artifact) can skip the
    /// gzip step.
    pub fn parse(&self, json_bytes: &[u8]) -> Result<VectorIndex> {
        let file: EmbeddingsFile = serde_json::from_slice(json_bytes)
            .map_err(|e| CoreError::IndexCorrupt(format!("failed to parse index JSON: {e}")))?;
        self.build(file)
    }

    fn build(&self, file: EmbeddingsFile) -> Result<VectorIndex> {
        let dim = file.embedding_dim;
        if dim == 0 {
            return Err(CoreError::IndexCorrupt("embedding_dim is zero".into()));
        }

        let mut embeddings = Vec::with_capacity(file.chunks.len() * dim);
        let mut chunks = Vec::with_capacity(file.chunks.len());
        let mut by_id = HashMap::with_capacity(file.chunks.len());

        for (i, embedded) in file.chunks.into_iter().enumerate() {
            if embedded.embedding.len() != dim {
                return Err(CoreError::IndexCorrupt(format!(
                    "chunk '{}' has embedding of length {}, expected {dim}",
                    embedded.chunk.chunk_id,
                    embedded.embedding.len()
                )));
            }
            if embedded.chunk.chunk_id.is_empty() {
                return Err(CoreError::IndexCorrupt(format!("chunk at index {i} has empty chunk_id")));
            }
            if embedded.chunk.document_id.is_empty() {
                return Err(CoreError::IndexCorrupt(format!(
                    "chunk '{}' has empty document_id",
                    embedded.chunk.chunk_id
                )));
            }
            if embedded.chunk.text.is_empty() {
                return Err(CoreError::IndexCorrupt(format!(
                    "chunk '{}' has empty text",
                    embedded.chunk.chunk_id
                )));
            }

            let norm: f32 = embedded.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if (norm - 1.0).abs() >= NORM_EPSILON {
                return Err(CoreError::IndexCorrupt(format!(
                    "chunk '{}' embedding is not L2-normalized (norm = {norm})",
                    embedded.chunk.chunk_id
                )));
            }

            if by_id.insert(embedded.chunk.chunk_id.clone(), i).is_some() {
                return Err(CoreError::IndexCorrupt(format!(
                    "duplicate chunk_id '{}'",
                    embedded.chunk.chunk_id
                )));
            }

            embeddings.extend_from_slice(&embedded.embedding);
            chunks.push(embedded.chunk);
        }

        if chunks.is_empty() {
            warn!("loaded vector index with zero chunks");
        } else {
            info!(chunk_count = chunks.len(), dim, "vector index loaded");
        }

        Ok(VectorIndex { dim, chunks, embeddings, by_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ChunkConfig;
    use crate::blobfetcher::BlobFetcher;
    use crate::document::{test_helpers, EmbeddedChunk};
    use crate::testutil::FakeBlobFetcher;
    use async_trait::async_trait;

    fn config() -> ChunkConfig {
        ChunkConfig { target_tokens: 250, overlap_tokens: 50, min_chunk_tokens: 100 }
    }

    fn unit_vector(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    fn valid_file() -> EmbeddingsFile {
        EmbeddingsFile {
            version: "1".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            model: "test-embedder".to_string(),
            embedding_dim: 4,
            total_chunks: 2,
            config: config(),
            chunks: vec![
                EmbeddedChunk {
                    chunk: test_helpers::chunk("doc_a", 0, crate::document::CategoryId::Safety),
                    embedding: unit_vector(4, 0),
                },
                EmbeddedChunk {
                    chunk: test_helpers::chunk("doc_b", 0, crate::document::CategoryId::Safety),
                    embedding: unit_vector(4, 1),
                },
            ],
        }
    }

    fn loader() -> IndexLoader {
        IndexLoader::new(std::sync::Arc::new(FakeBlobFetcher::default()))
    }

    #[test]
    fn parse_builds_a_valid_index() {
        let json = serde_json::to_vec(&valid_file()).unwrap();
        let index = loader().parse(&json).unwrap();
        assert_eq!(index.dim(), 4);
        assert_eq!(index.len(), 2);
        assert!(index.chunk_by_id("doc_a_chunk_0").is_some());
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = loader().parse(b"not json").unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[test]
    fn parse_rejects_zero_embedding_dim() {
        let mut file = valid_file();
        file.embedding_dim = 0;
        let json = serde_json::to_vec(&file).unwrap();
        let err = loader().parse(&json).unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[test]
    fn parse_rejects_dimension_mismatch_within_a_chunk() {
        let mut file = valid_file();
        file.chunks[0].embedding = vec![0.0; 3];
        let json = serde_json::to_vec(&file).unwrap();
        let err = loader().parse(&json).unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[test]
    fn parse_rejects_non_normalized_embedding() {
        let mut file = valid_file();
        file.chunks[0].embedding = vec![1.0, 1.0, 1.0, 1.0];
        let json = serde_json::to_vec(&file).unwrap();
        let err = loader().parse(&json).unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[test]
    fn parse_rejects_duplicate_chunk_ids() {
        let mut file = valid_file();
        file.chunks[1].chunk.chunk_id = file.chunks[0].chunk.chunk_id.clone();
        let json = serde_json::to_vec(&file).unwrap();
        let err = loader().parse(&json).unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[test]
    fn parse_accepts_empty_chunk_list() {
        let mut file = valid_file();
        file.chunks.clear();
        file.total_chunks = 0;
        let json = serde_json::to_vec(&file).unwrap();
        let index = loader().parse(&json).unwrap();
        assert!(index.is_empty());
    }

    struct FailingFetcher;

    #[async_trait]
    impl BlobFetcher for FailingFetcher {
        async fn fetch(&self, _path: &str) -> Result<Vec<u8>> {
            Err(CoreError::PipelineError("network down".into()))
        }
    }

    #[tokio::test]
    async fn load_surfaces_fetch_failure_as_index_corrupt() {
        let loader = IndexLoader::new(std::sync::Arc::new(FailingFetcher));
        let err = loader.load("embeddings.json.gz").await.unwrap_err();
        assert!(matches!(err, CoreError::IndexCorrupt(_)));
    }

    #[tokio::test]
    async fn load_decompresses_and_parses_a_gzip_blob() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let json = serde_json::to_vec(&valid_file()).unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).unwrap();
        let gz = encoder.finish().unwrap();

        let fetcher = FakeBlobFetcher::default().with_blob("embeddings.json.gz", gz);
        let loader = IndexLoader::new(std::sync::Arc::new(fetcher));
        let index = loader.load("embeddings.json.gz").await.unwrap();
        assert_eq!(index.len(), 2);
    }
}
