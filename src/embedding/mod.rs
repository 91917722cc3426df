//! Embedding acquisition: remote service client + batched fetcher

pub mod client;
pub mod fetcher;

use crate::errors::Result;
use async_trait::async_trait;

pub use client::EmbeddingClient;
pub use fetcher::BatchFetcher;

/// Remote embedding service seam.
///
/// Implementations must preserve input order and may fail transiently;
/// callers wrap each batch in the retry policy.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts under the given task label
    async fn embed_batch(&self, texts: &[String], task: &str) -> Result<Vec<Vec<f32>>>;
}
