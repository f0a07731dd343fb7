//! Configuration for the runtime retrieval/routing/generation core.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Configuration parameters for [`crate::pipeline::RagPipeline`] and
/// [`crate::router::QueryRouter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Dimensionality every stored and query embedding must have.
    pub embedding_dim: usize,
    /// Default number of chunks retrieved per query.
    pub top_k: usize,
    /// Top-1 score at or above which the router grounds in documents.
    pub router_threshold_high: f32,
    /// Top-1 score below which the router has no usable signal at all.
    pub router_threshold_low: f32,
    /// Total prompt token budget before reserving generation headroom.
    pub context_max_tokens: usize,
    /// Tokens reserved for the model's continuation, subtracted from
    /// `context_max_tokens` to get the history truncation budget.
    pub prompt_reserve_tokens: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 768,
            top_k: 5,
            router_threshold_high: 0.6,
            router_threshold_low: 0.4,
            context_max_tokens: 512,
            prompt_reserve_tokens: 100,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a validated [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The history-truncation token budget: `context_max_tokens - prompt_reserve_tokens`.
    pub fn prompt_budget_tokens(&self) -> usize {
        self.context_max_tokens.saturating_sub(self.prompt_reserve_tokens)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.config.embedding_dim = dim;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn router_thresholds(mut self, low: f32, high: f32) -> Self {
        self.config.router_threshold_low = low;
        self.config.router_threshold_high = high;
        self
    }

    pub fn context_max_tokens(mut self, max: usize) -> Self {
        self.config.context_max_tokens = max;
        self
    }

    pub fn prompt_reserve_tokens(mut self, reserve: usize) -> Self {
        self.config.prompt_reserve_tokens = reserve;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigError`] if:
    /// - `embedding_dim == 0`
    /// - `top_k == 0`
    /// - thresholds are outside `[0, 1]` or `low > high`
    /// - `prompt_reserve_tokens >= context_max_tokens`
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.embedding_dim == 0 {
            return Err(CoreError::ConfigError("embedding_dim must be greater than zero".into()));
        }
        if c.top_k == 0 {
            return Err(CoreError::ConfigError("top_k must be greater than zero".into()));
        }
        if !(0.0..=1.0).contains(&c.router_threshold_low)
            || !(0.0..=1.0).contains(&c.router_threshold_high)
        {
            return Err(CoreError::ConfigError("router thresholds must lie in [0, 1]".into()));
        }
        if c.router_threshold_low > c.router_threshold_high {
            return Err(CoreError::ConfigError(format!(
                "router_threshold_low ({}) must be <= router_threshold_high ({})",
                c.router_threshold_low, c.router_threshold_high
            )));
        }
        if c.prompt_reserve_tokens >= c.context_max_tokens {
            return Err(CoreError::ConfigError(format!(
                "prompt_reserve_tokens ({}) must be less than context_max_tokens ({})",
                c.prompt_reserve_tokens, c.context_max_tokens
            )));
        }
        Ok(self.config)
    }
}
