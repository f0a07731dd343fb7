//! The [`BlobFetcher`] collaborator trait.

use async_trait::async_trait;

use crate::error::Result;

/// Fetches raw bytes for a path — the runtime's only I/O boundary.
///
/// [`crate::index_loader::IndexLoader`] uses this to retrieve the gzip-compressed
/// vector index without caring whether it comes from an HTTP request, a bundled
/// asset, or a local file; the core has no transport opinion of its own.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetch the raw bytes at `path`.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}
