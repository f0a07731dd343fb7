//! Configuration for the offline ingestion pipeline: chunking parameters,
//! batching/politeness knobs, and I/O locations. Built from CLI flags, an
//! optional `unirag.toml`, and environment variables (`clap`'s `env`
//! feature), in that order of precedence.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{IngestError, Result};

/// Chunking parameters, shared with `unirag-core` via
/// [`unirag_core::artifacts::ChunkConfig`] so the produced artifacts always
/// carry the config they were built with.
pub const DEFAULT_TARGET_TOKENS: usize = 250;
pub const DEFAULT_OVERLAP_TOKENS: usize = 50;
pub const DEFAULT_MIN_CHUNK_TOKENS: usize = 100;

/// CLI flags for the `unirag-ingest` binary.
///
/// Any flag left unset falls back to the value in `unirag.toml` (if
/// present in the working directory or pointed to by `--config`), then to
/// the hardcoded default.
#[derive(Debug, Parser)]
#[command(name = "unirag-ingest")]
#[command(version)]
#[command(about = "Offline fetch -> extract -> chunk -> embed pipeline for the regulatory document RAG index")]
pub struct Cli {
    /// Path to a TOML config file merged under the CLI flags.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory for downloaded payloads, extracted text, and the
    /// produced artifacts.
    #[arg(long, env = "UNIRAG_OUTPUT_DIR", default_value = "data")]
    pub output_dir: PathBuf,

    /// The index page to discover document links from.
    #[arg(long, env = "UNIRAG_INDEX_URL")]
    pub index_url: Option<String>,

    /// Target estimated tokens per chunk.
    #[arg(long)]
    pub target_tokens: Option<usize>,

    /// Estimated tokens of overlap between consecutive chunks.
    #[arg(long)]
    pub overlap_tokens: Option<usize>,

    /// Minimum estimated tokens for the trailing chunk of a document to be
    /// emitted.
    #[arg(long)]
    pub min_chunk_tokens: Option<usize>,

    /// Number of chunks embedded per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Milliseconds to pause between embedding batches.
    #[arg(long)]
    pub batch_pause_ms: Option<u64>,

    /// Milliseconds to wait between sequential document downloads.
    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    /// Base URL of the OpenAI-compatible embeddings endpoint.
    #[arg(long, env = "UNIRAG_EMBEDDER_BASE_URL")]
    pub embedder_base_url: Option<String>,

    /// API key for the embeddings endpoint.
    #[arg(long, env = "UNIRAG_EMBEDDER_API_KEY")]
    pub embedder_api_key: Option<String>,

    /// Model name to request from the embeddings endpoint.
    #[arg(long, env = "UNIRAG_EMBEDDER_MODEL")]
    pub embedder_model: Option<String>,
}

/// A `unirag.toml` file, every field optional so the CLI can overlay
/// whichever subset it doesn't already have a value for.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub index_url: Option<String>,
    pub target_tokens: Option<usize>,
    pub overlap_tokens: Option<usize>,
    pub min_chunk_tokens: Option<usize>,
    pub batch_size: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub embedder_base_url: Option<String>,
    pub embedder_api_key: Option<String>,
    pub embedder_model: Option<String>,
}

/// Fully resolved ingestion configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub output_dir: PathBuf,
    pub index_url: String,
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub min_chunk_tokens: usize,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub request_delay_ms: u64,
    pub embedder_base_url: String,
    pub embedder_api_key: String,
    pub embedder_model: String,
}

impl IngestConfig {
    /// Resolve CLI flags and an optional TOML file into a validated config.
    /// CLI flags win over the file, which wins over the hardcoded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ConfigError`] if no `index_url` is supplied by
    /// either source, or if `overlap_tokens >= target_tokens`.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text)
                    .map_err(|e| IngestError::ConfigError(format!("invalid config file: {e}")))?
            }
            None => FileConfig::default(),
        };

        let index_url = cli
            .index_url
            .or(file.index_url)
            .ok_or_else(|| IngestError::ConfigError("index_url must be set via --index-url, UNIRAG_INDEX_URL, or the config file".into()))?;

        let output_dir = if cli.output_dir == PathBuf::from("data") {
            file.output_dir.unwrap_or(cli.output_dir)
        } else {
            cli.output_dir
        };

        let config = Self {
            output_dir,
            index_url,
            target_tokens: cli.target_tokens.or(file.target_tokens).unwrap_or(DEFAULT_TARGET_TOKENS),
            overlap_tokens: cli.overlap_tokens.or(file.overlap_tokens).unwrap_or(DEFAULT_OVERLAP_TOKENS),
            min_chunk_tokens: cli
                .min_chunk_tokens
                .or(file.min_chunk_tokens)
                .unwrap_or(DEFAULT_MIN_CHUNK_TOKENS),
            batch_size: cli.batch_size.or(file.batch_size).unwrap_or(10),
            batch_pause_ms: cli.batch_pause_ms.or(file.batch_pause_ms).unwrap_or(1000),
            request_delay_ms: cli.request_delay_ms.or(file.request_delay_ms).unwrap_or(1000),
            embedder_base_url: cli
                .embedder_base_url
                .or(file.embedder_base_url)
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            embedder_api_key: cli.embedder_api_key.or(file.embedder_api_key).unwrap_or_default(),
            embedder_model: cli
                .embedder_model
                .or(file.embedder_model)
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
        };

        if config.overlap_tokens >= config.target_tokens {
            return Err(IngestError::ConfigError(format!(
                "overlap_tokens ({}) must be less than target_tokens ({})",
                config.overlap_tokens, config.target_tokens
            )));
        }

        Ok(config)
    }

    pub fn chunk_config(&self) -> unirag_core::artifacts::ChunkConfig {
        unirag_core::artifacts::ChunkConfig {
            target_tokens: self.target_tokens,
            overlap_tokens: self.overlap_tokens,
            min_chunk_tokens: self.min_chunk_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            config: None,
            output_dir: PathBuf::from("data"),
            index_url: Some("https://example.test/index".to_string()),
            target_tokens: None,
            overlap_tokens: None,
            min_chunk_tokens: None,
            batch_size: None,
            batch_pause_ms: None,
            request_delay_ms: None,
            embedder_base_url: None,
            embedder_api_key: None,
            embedder_model: None,
        }
    }

    #[test]
    fn resolve_applies_defaults_when_only_index_url_given() {
        let config = IngestConfig::resolve(base_cli()).unwrap();
        assert_eq!(config.target_tokens, DEFAULT_TARGET_TOKENS);
        assert_eq!(config.overlap_tokens, DEFAULT_OVERLAP_TOKENS);
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn resolve_rejects_missing_index_url() {
        let mut cli = base_cli();
        cli.index_url = None;
        let err = IngestConfig::resolve(cli).unwrap_err();
        assert!(matches!(err, IngestError::ConfigError(_)));
    }

    #[test]
    fn resolve_rejects_overlap_not_smaller_than_target() {
        let mut cli = base_cli();
        cli.target_tokens = Some(100);
        cli.overlap_tokens = Some(100);
        let err = IngestConfig::resolve(cli).unwrap_err();
        assert!(matches!(err, IngestError::ConfigError(_)));
    }

    #[test]
    fn cli_flags_override_file_config() {
        let mut cli = base_cli();
        cli.target_tokens = Some(300);
        let config = IngestConfig::resolve(cli).unwrap();
        assert_eq!(config.target_tokens, 300);
    }
}
