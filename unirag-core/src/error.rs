//! Error types for the `unirag-core` crate.

use thiserror::Error;

/// Errors that can occur in the runtime retrieval/routing/generation core.
///
/// Most of these never escape the crate's public boundary: [`crate::router::QueryRouter`]
/// downgrades any of them to a `general` [`crate::document::RoutingDecision`], and
/// [`crate::pipeline::RagPipeline`] converts them into a tagged `error` [`crate::document::RAGResult`].
/// [`CoreError::IndexCorrupt`] is the one exception — it is fatal and only ever raised
/// during [`crate::index_loader::IndexLoader`] startup.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The embeddings blob failed to parse, or violated one of the structural
    /// invariants in its §3 data model (missing vectors, dimension mismatch,
    /// empty ids). Fatal — the runtime cannot proceed without a valid index.
    #[error("vector index is corrupt: {0}")]
    IndexCorrupt(String),

    /// A query vector's length did not match the index's `embedding_dim`.
    #[error("query vector has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        /// The dimension the index was built with.
        expected: usize,
        /// The dimension of the vector actually supplied.
        actual: usize,
    },

    /// A caller-supplied argument was invalid (e.g. `top_k == 0`, an unknown
    /// forced routing mode).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A chat message failed validation (empty, or over the length limit).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The configured [`crate::embedder::Embedder`] is not ready to serve requests.
    #[error("embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    /// The configured [`crate::generator::Generator`] is not ready to serve requests.
    #[error("generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// A query was cancelled by the caller's abort mechanism mid-flight.
    #[error("query cancelled")]
    Cancelled,

    /// A configuration value failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// An error occurred during pipeline orchestration that doesn't fit the
    /// more specific kinds above (e.g. a collaborator error surfaced with
    /// its original message attached).
    #[error("pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
