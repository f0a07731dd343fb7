//! Data types for documents, categories, chunks, and search/routing results.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed twelve-category taxonomy plus the `uncategorized` fallback.
///
/// A closed enum rather than a bare `String`: an unrecognized category id
/// is a parse error in the offline pipeline, and the runtime never has to
/// guess what a category id it doesn't recognize means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    GeneralOperations,
    AntiCorruption,
    AcademicCouncil,
    StructuralDivisions,
    EducationalProcess,
    ScientificWork,
    FinancialActivities,
    InformationActivities,
    SocialCivic,
    Dormitories,
    HrManagement,
    Safety,
    /// Fallback for documents the fetcher could not assign to a heading.
    Uncategorized,
}

impl CategoryId {
    /// The twelve closed-taxonomy categories, in the order they appear on
    /// the index page (Glossary order). Does not include [`CategoryId::Uncategorized`].
    pub const ALL: [CategoryId; 12] = [
        CategoryId::GeneralOperations,
        CategoryId::AntiCorruption,
        CategoryId::AcademicCouncil,
        CategoryId::StructuralDivisions,
        CategoryId::EducationalProcess,
        CategoryId::ScientificWork,
        CategoryId::FinancialActivities,
        CategoryId::InformationActivities,
        CategoryId::SocialCivic,
        CategoryId::Dormitories,
        CategoryId::HrManagement,
        CategoryId::Safety,
    ];

    /// The stable string id, matching the `id` field of the serialized
    /// [`Category`] and the wire representation used everywhere else.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::GeneralOperations => "general_operations",
            CategoryId::AntiCorruption => "anti_corruption",
            CategoryId::AcademicCouncil => "academic_council",
            CategoryId::StructuralDivisions => "structural_divisions",
            CategoryId::EducationalProcess => "educational_process",
            CategoryId::ScientificWork => "scientific_work",
            CategoryId::FinancialActivities => "financial_activities",
            CategoryId::InformationActivities => "information_activities",
            CategoryId::SocialCivic => "social_civic",
            CategoryId::Dormitories => "dormitories",
            CategoryId::HrManagement => "hr_management",
            CategoryId::Safety => "safety",
            CategoryId::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not match any known category id.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown category id: {0}")]
pub struct UnknownCategoryId(pub String);

impl FromStr for CategoryId {
    type Err = UnknownCategoryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "general_operations" => CategoryId::GeneralOperations,
            "anti_corruption" => CategoryId::AntiCorruption,
            "academic_council" => CategoryId::AcademicCouncil,
            "structural_divisions" => CategoryId::StructuralDivisions,
            "educational_process" => CategoryId::EducationalProcess,
            "scientific_work" => CategoryId::ScientificWork,
            "financial_activities" => CategoryId::FinancialActivities,
            "information_activities" => CategoryId::InformationActivities,
            "social_civic" => CategoryId::SocialCivic,
            "dormitories" => CategoryId::Dormitories,
            "hr_management" => CategoryId::HrManagement,
            "safety" => CategoryId::Safety,
            "uncategorized" => CategoryId::Uncategorized,
            other => return Err(UnknownCategoryId(other.to_string())),
        })
    }
}

/// Detected document language. Detection is Cyrillic-codepoint presence
/// in the title (see `unirag-ingest::fetcher`); there is no other
/// language-specific logic anywhere in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Uk,
    En,
}

/// The on-disk payload format a [`Document`] was downloaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Docx,
    Doc,
    Unknown,
}

/// An immutable record produced by the fetcher. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, stable across pipeline runs.
    pub id: String,
    pub title: String,
    pub filename: String,
    pub source_url: String,
    pub category: CategoryId,
    pub language: Language,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_date: Option<String>,
}

/// One of the twelve categories (plus `uncategorized`), with bilingual
/// display metadata and a computed document count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name_uk: String,
    pub name_en: String,
    pub icon: String,
    pub description_uk: String,
    pub description_en: String,
    pub document_count: usize,
}

/// Minimal copy of a document's metadata carried on every [`Chunk`], so
/// consumers don't need a catalog lookup just to show a source snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_title: String,
    pub document_filename: String,
    pub source_url: String,
}

/// A sentence-aligned text window produced by the chunker. Read-only once
/// produced; `chunk_id` is `"{document_id}_chunk_{chunk_index}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub tokens: usize,
    pub chunk_index: usize,
    pub category: CategoryId,
    pub language: Language,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Build the canonical chunk id for a document id and index.
    pub fn make_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }
}

/// A [`Chunk`] plus its L2-normalized dense embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A user query string. Transient — never persisted.
pub type Query = String;

/// The outcome of a [`crate::router::QueryRouter`] decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Rag,
    General,
    NoResults,
    Error,
}

/// A scored [`Chunk`] returned from a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// The result of [`crate::router::QueryRouter::route`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub mode: RouteMode,
    pub confidence: f32,
    pub reason: String,
    pub top_chunks: Vec<ScoredChunk>,
}

/// Per-stage timing breakdown for one [`crate::pipeline::RagPipeline`] call, in
/// milliseconds as reported by the injected [`crate::clock::Clock`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Timings {
    pub embed_ms: u64,
    pub retrieve_ms: u64,
    pub generate_ms: u64,
}

/// Aggregate metadata attached to a `rag`-mode [`RAGResult`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub timings: Timings,
    pub retrieved_count: usize,
    pub source_count: usize,
    pub avg_similarity: f32,
}

/// The outcome of [`crate::pipeline::RagPipeline::answer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    pub mode: RouteMode,
    pub answer: String,
    pub retrieved_chunks: Vec<ScoredChunk>,
    pub sources: Vec<Document>,
    pub metadata: ResultMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// In-memory container the runtime builds once at startup and holds for the
/// process lifetime. Immutable after [`crate::index_loader::IndexLoader::load`] returns.
pub struct VectorIndex {
    pub(crate) dim: usize,
    pub(crate) chunks: Vec<Chunk>,
    /// Row-major dense buffer of length `chunks.len() * dim`.
    pub(crate) embeddings: Vec<f32>,
    pub(crate) by_id: HashMap<String, usize>,
}

impl VectorIndex {
    /// Build an index directly from chunk/vector pairs, bypassing the
    /// artifact JSON entirely. Used by [`crate::index_loader::IndexLoader`]
    /// internally and by tests across the crate that need a populated
    /// index without round-tripping through `serde_json`.
    pub(crate) fn from_pairs(dim: usize, pairs: Vec<(Chunk, Vec<f32>)>) -> Self {
        let mut chunks = Vec::with_capacity(pairs.len());
        let mut embeddings = Vec::with_capacity(pairs.len() * dim);
        let mut by_id = HashMap::with_capacity(pairs.len());
        for (i, (chunk, vector)) in pairs.into_iter().enumerate() {
            debug_assert_eq!(vector.len(), dim);
            by_id.insert(chunk.chunk_id.clone(), i);
            embeddings.extend_from_slice(&vector);
            chunks.push(chunk);
        }
        Self { dim, chunks, embeddings, by_id }
    }

    /// The embedding dimensionality every stored vector shares.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Look up a chunk by its `chunk_id`.
    pub fn chunk_by_id(&self, chunk_id: &str) -> Option<&Chunk> {
        self.by_id.get(chunk_id).map(|&i| &self.chunks[i])
    }

    /// The embedding vector for the chunk stored at row `i`.
    pub(crate) fn row(&self, i: usize) -> &[f32] {
        &self.embeddings[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate all stored chunks in storage order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub fn chunk(document_id: &str, index: usize, category: CategoryId) -> Chunk {
        Chunk {
            chunk_id: Chunk::make_id(document_id, index),
            document_id: document_id.to_string(),
            text: format!("chunk {index} of {document_id}"),
            tokens: 10,
            chunk_index: index,
            category,
            language: Language::En,
            metadata: ChunkMetadata {
                document_title: format!("{document_id} title"),
                document_filename: format!("{document_id}.pdf"),
                source_url: format!("https://example.test/{document_id}"),
            },
        }
    }

    pub fn document(id: &str, category: CategoryId) -> Document {
        Document {
            id: id.to_string(),
            title: format!("{id} title"),
            filename: format!("{id}.pdf"),
            source_url: format!("https://example.test/{id}"),
            category,
            language: Language::En,
            doc_type: DocumentType::Pdf,
            downloaded: true,
            download_error: None,
            download_date: Some("2026-01-01".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_round_trips_through_str() {
        for &c in CategoryId::ALL.iter() {
            let s = c.as_str();
            assert_eq!(s.parse::<CategoryId>().unwrap(), c);
        }
        assert_eq!("uncategorized".parse::<CategoryId>().unwrap(), CategoryId::Uncategorized);
        assert!("not_a_category".parse::<CategoryId>().is_err());
    }

    #[test]
    fn chunk_id_format() {
        assert_eq!(Chunk::make_id("doc_1", 0), "doc_1_chunk_0");
        assert_eq!(Chunk::make_id("doc_1", 12), "doc_1_chunk_12");
    }
}
