//! Error types for the offline ingestion pipeline.

use thiserror::Error;

/// Errors raised by the offline fetch/extract/chunk/embed pipeline.
///
/// Per-document failures (`DownloadFailed`, `ExtractionFailed`,
/// `UnknownShareLink`) are recorded against that document and do not abort
/// the run; they are surfaced through this type so callers can choose
/// whether to log-and-continue or bail.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A link's share-host pattern was not recognized.
    #[error("unrecognized share link: {0}")]
    UnknownShareLink(String),

    /// A document payload could not be downloaded.
    #[error("download failed for '{url}': {message}")]
    DownloadFailed { url: String, message: String },

    /// Text could not be extracted from a downloaded payload.
    #[error("extraction failed for '{path}': {message}")]
    ExtractionFailed { path: String, message: String },

    /// The chunker was given an unexpected input shape.
    #[error("chunking error: {0}")]
    ChunkingError(String),

    /// A configuration value failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Propagated from `unirag-core` (e.g. embedding dimension mismatch).
    #[error(transparent)]
    Core(#[from] unirag_core::error::CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A convenience result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
