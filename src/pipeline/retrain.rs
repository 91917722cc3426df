//! Retraining workflow trigger
//!
//! Fires only after a successful synthesis and artifact hand-off; the
//! cooldown timestamp is persisted by the pipeline immediately afterwards.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Request timeout (10 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retraining-workflow seam
#[async_trait]
pub trait RetrainHook: Send + Sync {
    /// Kick off the retraining workflow
    async fn trigger(&self) -> Result<()>;
}

/// Posts to the training workflow's webhook
pub struct WebhookRetrainTrigger {
    client: Client,
    url: String,
}

impl WebhookRetrainTrigger {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DriftError::HttpError)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RetrainHook for WebhookRetrainTrigger {
    async fn trigger(&self) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .map_err(|e| DriftError::Generic(format!("Retrain webhook failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DriftError::Generic(format!(
                "Retrain webhook returned HTTP {}",
                response.status()
            )));
        }

        info!(url = %self.url, "Triggered retraining workflow");
        Ok(())
    }
}

/// Log-only trigger used when no webhook is configured
pub struct LoggingRetrainTrigger;

#[async_trait]
impl RetrainHook for LoggingRetrainTrigger {
    async fn trigger(&self) -> Result<()> {
        info!("Retraining requested (no webhook configured)");
        Ok(())
    }
}

/// Counting trigger for tests and embedded use
#[derive(Default)]
pub struct MemoryRetrainHook {
    triggers: Mutex<usize>,
}

impl MemoryRetrainHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger_count(&self) -> usize {
        *self.triggers.lock().unwrap()
    }
}

#[async_trait]
impl RetrainHook for MemoryRetrainHook {
    async fn trigger(&self) -> Result<()> {
        *self.triggers.lock().unwrap() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_hook_counts() {
        let hook = MemoryRetrainHook::new();
        assert_eq!(hook.trigger_count(), 0);
        hook.trigger().await.unwrap();
        hook.trigger().await.unwrap();
        assert_eq!(hook.trigger_count(), 2);
    }

    #[tokio::test]
    async fn test_logging_trigger_succeeds() {
        assert!(LoggingRetrainTrigger.trigger().await.is_ok());
    }
}
