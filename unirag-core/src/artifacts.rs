//! Wire types for the persisted artifacts described in spec.md §6.
//!
//! These are shared between `unirag-core` (which only ever reads
//! [`EmbeddingsFile`], via [`crate::index_loader::IndexLoader`]) and
//! `unirag-ingest` (which writes all four). Sharing the Rust type between
//! writer and reader turns the wire-format contract into a compile-time
//! guarantee instead of a hand-maintained convention.

use serde::{Deserialize, Serialize};

use crate::document::{Category, Chunk, Document, EmbeddedChunk};

/// The chunking parameters a given artifact set was produced with,
/// embedded in both `chunks.json` and `embeddings.json` for provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub min_chunk_tokens: usize,
}

/// Per-category document count, as carried in `documents.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub id: crate::document::CategoryId,
    pub count: usize,
}

/// `documents.json` — artifact 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsManifest {
    pub version: String,
    pub generated_at: String,
    pub source_url: String,
    pub total_documents: usize,
    pub downloaded_count: usize,
    pub categories: Vec<CategoryCount>,
    pub documents: Vec<Document>,
}

/// `chunks.json` — artifact 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunksFile {
    pub version: String,
    pub generated_at: String,
    pub config: ChunkConfig,
    pub total_chunks: usize,
    pub chunks: Vec<Chunk>,
}

/// `embeddings.json` / `embeddings.json.gz` — artifact 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsFile {
    pub version: String,
    pub generated_at: String,
    pub model: String,
    pub embedding_dim: usize,
    pub total_chunks: usize,
    pub config: ChunkConfig,
    pub chunks: Vec<EmbeddedChunk>,
}

/// `categories.json` — artifact 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriesFile {
    pub version: String,
    pub generated_at: String,
    pub total_categories: usize,
    pub categories: Vec<Category>,
}
