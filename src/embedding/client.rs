//! HTTP client for the embedding service
//!
//! Endpoint: POST /v1/embed with a model name, task label and text batch.
//! Responses are validated for count and dimension before use.

use crate::embedding::EmbeddingService;
use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout (30 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Embedding request payload
#[derive(Debug, Clone, Serialize)]
struct EmbedRequest {
    model: String,
    task: String,
    input: Vec<String>,
}

/// Embedding response payload
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP client for the embedding service
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    expected_dim: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(base_url: &str, model: &str, expected_dim: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DriftError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            expected_dim,
        })
    }

    /// Check if the embedding service is reachable
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        self.client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok()
    }
}

#[async_trait]
impl EmbeddingService for EmbeddingClient {
    async fn embed_batch(&self, texts: &[String], task: &str) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embed", self.base_url);

        let request = EmbedRequest {
            model: self.model.clone(),
            task: task.to_string(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DriftError::EmbeddingError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DriftError::EmbeddingError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DriftError::EmbeddingError(format!("Failed to parse response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(DriftError::EmbeddingError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        for embedding in &body.embeddings {
            if embedding.len() != self.expected_dim {
                return Err(DriftError::DimensionMismatch {
                    expected: self.expected_dim,
                    actual: embedding.len(),
                });
            }
        }

        Ok(body.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EmbeddingClient::new("http://localhost:8090", "text-embedding-005", 768);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "http://localhost:8090");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client =
            EmbeddingClient::new("http://localhost:8090/", "text-embedding-005", 768).unwrap();
        assert_eq!(client.base_url, "http://localhost:8090");
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbedRequest {
            model: "text-embedding-005".to_string(),
            task: "CLUSTERING".to_string(),
            input: vec!["what courses cover rust?".to_string()],
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("CLUSTERING"));
        assert!(json.contains("what courses cover rust?"));
    }

    #[tokio::test]
    #[ignore] // Requires embedding service running
    async fn test_embed_batch_integration() {
        let client =
            EmbeddingClient::new("http://localhost:8090", "text-embedding-005", 768).unwrap();
        let texts = vec!["hello".to_string(), "world".to_string()];
        let embeddings = client.embed_batch(&texts, "CLUSTERING").await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 768));
    }
}
