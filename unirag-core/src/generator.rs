//! The [`Generator`] collaborator trait and its generation knobs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling parameters passed through to the underlying language model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_new_tokens: usize,
    pub top_k: usize,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub do_sample: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_new_tokens: 512,
            top_k: 40,
            top_p: 0.95,
            repetition_penalty: 1.1,
            do_sample: true,
        }
    }
}

/// A language-model backend that turns a prompt into a continuation.
///
/// Supplied by the model runtime (spec.md §1); the core does not define or
/// ship a concrete implementation. `generate` returns only the continuation,
/// excluding the prompt itself.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a continuation of `prompt` under the given `config`.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}
