//! HTTP client for the generative model service
//!
//! Single non-streaming completion per call. Safety filtering is configured
//! maximally permissive: every harm category is set to block-none, an
//! explicit value choice carried over from the deployed service.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Request timeout (120 seconds; generation is slow)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Harm categories disabled on every request
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Generation service seam
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generation tuning sent with every request
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Generation request payload
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    generation_config: GenerationConfig,
    safety_settings: BTreeMap<String, String>,
}

/// Generation response payload
#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// HTTP client for the generation service
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    base_url: String,
    model: String,
    config: GenerationConfig,
}

impl GenerationClient {
    /// Create a new generation client
    pub fn new(base_url: &str, model: &str, config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DriftError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            config,
        })
    }

    fn permissive_safety() -> BTreeMap<String, String> {
        HARM_CATEGORIES
            .iter()
            .map(|c| (c.to_string(), "BLOCK_NONE".to_string()))
            .collect()
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            generation_config: self.config.clone(),
            safety_settings: Self::permissive_safety(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DriftError::GenerationError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DriftError::GenerationError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DriftError::GenerationError(format!("Failed to parse response: {}", e)))?;

        Ok(body.text)
    }
}
