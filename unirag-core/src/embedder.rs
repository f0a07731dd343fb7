//! The [`Embedder`] collaborator trait.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns a text string into a fixed-dimensional, L2-normalized
/// embedding vector.
///
/// The core does not implement this trait — it is supplied by the embedding
/// model runtime (spec.md §1, "external collaborators"). The same implementation
/// must be used by the offline ingestion pipeline and the online runtime;
/// mismatched pooling or normalization between the two silently invalidates
/// every similarity score (spec.md §4.4).
///
/// # Example
///
/// ```rust,ignore
/// use unirag_core::embedder::Embedder;
///
/// let vector = embedder.embed("query text").await?;
/// assert_eq!(vector.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text input, returning an L2-normalized vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
