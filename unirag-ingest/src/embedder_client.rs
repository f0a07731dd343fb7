//! A thin HTTP [`Embedder`] adapter for the offline pipeline.
//!
//! `unirag-core` treats the embedder purely as an external collaborator
//! (spec's model runtime is out of scope); this adapter is the minimal
//! concrete implementation the `unirag-ingest` binary needs to actually
//! produce embeddings, not a general-purpose provider abstraction. It
//! speaks the OpenAI-compatible `/embeddings` wire format, which is also
//! what most self-hosted embedding servers expose.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use unirag_core::embedder::Embedder;
use unirag_core::error::{CoreError, Result};

const DEFAULT_DIMENSIONS: usize = 768;

/// An [`Embedder`] backed by an OpenAI-compatible embeddings endpoint.
///
/// Vectors returned by the API are L2-normalized locally before being
/// handed back, so the normalization invariant holds even against a
/// backend that doesn't already guarantee it (spec's open question about
/// trusting the embedder's normalization).
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Override the output dimension (Matryoshka truncation). Sent on every
    /// request, so the API is actually asked to return vectors of this
    /// length rather than whatever the model's native dimension is.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(model = %self.model, text_len = text.len(), "embedding text");

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: text, dimensions: self.dimensions })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                CoreError::EmbedderUnavailable(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "embedding API returned an error");
            return Err(CoreError::EmbedderUnavailable(format!("API returned {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CoreError::EmbedderUnavailable(format!("failed to parse response: {e}")))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::EmbedderUnavailable("API returned no embedding data".to_string()))?
            .embedding;

        Ok(l2_normalize(embedding))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
