//! Batched embedding fetch over the remote service
//!
//! Splits the input into fixed-size batches and sends each through the
//! retry policy. Output order matches input order across batches. A batch
//! that exhausts its retries fails the whole fetch.

use crate::embedding::EmbeddingService;
use crate::errors::Result;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::info;

/// Batched, order-preserving embedding fetcher
pub struct BatchFetcher {
    service: Arc<dyn EmbeddingService>,
    policy: RetryPolicy,
    batch_size: usize,
    task: String,
}

impl BatchFetcher {
    /// Create a new fetcher over the given service
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        policy: RetryPolicy,
        batch_size: usize,
        task: &str,
    ) -> Self {
        Self {
            service,
            policy,
            batch_size: batch_size.max(1),
            task: task.to_string(),
        }
    }

    /// Fetch one embedding per input query, in input order
    pub async fn fetch(&self, queries: &[String]) -> Result<Vec<Vec<f32>>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(queries.len());

        for chunk in queries.chunks(self.batch_size) {
            let batch = self
                .policy
                .execute(|| async move { self.service.embed_batch(chunk, &self.task).await })
                .await?;
            embeddings.extend(batch);
        }

        info!(count = embeddings.len(), task = %self.task, "Fetched embeddings");
        Ok(embeddings)
    }
}
