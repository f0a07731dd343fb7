//! Deterministic fakes for the collaborator traits, for use in this
//! crate's own tests and by downstream crates that want to exercise the
//! pipeline without a real embedding/generation backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::blobfetcher::BlobFetcher;
use crate::clock::Clock;
use crate::embedder::Embedder;
use crate::error::{CoreError, Result};
use crate::generator::{GenerationConfig, Generator};
use crate::tokencounter::TokenCounter;

/// An [`Embedder`] that returns a fixed vector per exact text match, and a
/// zero vector of the configured dimension for anything else.
pub struct FakeEmbedder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, vectors: HashMap::new() }
    }

    /// Register the vector to return for an exact text match.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// An [`Embedder`] that always fails, for exercising the router/pipeline's
/// error-handling paths.
pub struct FailingEmbedder {
    pub dim: usize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(CoreError::EmbedderUnavailable("fake embedder always fails".into()))
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// A [`Generator`] that echoes the prompt length, or a fixed response if
/// one is configured.
pub struct FakeGenerator {
    response: String,
}

impl FakeGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// A [`BlobFetcher`] backed by an in-memory map, for tests that don't want
/// real network or filesystem access.
#[derive(Default)]
pub struct FakeBlobFetcher {
    blobs: HashMap<String, Vec<u8>>,
}

impl FakeBlobFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.blobs.insert(path.into(), bytes);
        self
    }
}

#[async_trait]
impl BlobFetcher for FakeBlobFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::PipelineError(format!("no blob registered for '{path}'")))
    }
}

/// A [`Clock`] with a manually advanced counter, for deterministic timing
/// assertions.
#[derive(Default)]
pub struct FakeClock {
    ms: AtomicU64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta_ms` milliseconds.
    pub fn advance(&self, delta_ms: u64) {
        self.ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

/// A [`TokenCounter`] using the chunker's own `chars / 3.5` heuristic, for
/// tests that don't need a real tokenizer.
pub struct CharEstimateCounter;

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> usize {
        (text.chars().count() as f32 / 3.5).ceil() as usize
    }
}
