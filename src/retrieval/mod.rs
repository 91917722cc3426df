//! Grounding retrieval for escalated queries
//!
//! The production implementation embeds the query and runs a cosine vector
//! search over the course-content collection, then joins the hits into one
//! punctuation-stripped content blob for the generation prompt.

use crate::embedding::EmbeddingService;
use crate::errors::{DriftError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{with_payload_selector::SelectorOptions, SearchPoints, WithPayloadSelector},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Embedding task label for retrieval queries
const RETRIEVAL_TASK: &str = "RETRIEVAL_QUERY";

/// Grounding content for one query
#[derive(Debug, Clone, PartialEq)]
pub struct Grounding {
    /// Course reference numbers of the matched content
    pub crns: Vec<String>,
    /// Joined content of all hits
    pub content: String,
}

/// Semantic-search seam consumed by the sample synthesizer
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve grounding content for a query
    async fn semantic_search(&self, query: &str) -> Result<Grounding>;
}

/// Remove all punctuation from retrieved content
fn remove_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Qdrant-backed retriever over the course-content collection
pub struct QdrantRetriever {
    client: QdrantClient,
    embedder: Arc<dyn EmbeddingService>,
    policy: RetryPolicy,
    collection: String,
    top_k: u64,
}

impl QdrantRetriever {
    /// Connect to qdrant and target the given collection
    pub fn new(
        url: &str,
        embedder: Arc<dyn EmbeddingService>,
        policy: RetryPolicy,
        collection: &str,
        top_k: usize,
    ) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(|e| DriftError::RetrievalError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            embedder,
            policy,
            collection: collection.to_string(),
            top_k: top_k as u64,
        })
    }

    fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> Option<String> {
        payload.get(key).and_then(|v| {
            use qdrant_client::qdrant::value::Kind;
            match v.kind.as_ref() {
                Some(Kind::StringValue(s)) => Some(s.clone()),
                _ => None,
            }
        })
    }
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn semantic_search(&self, query: &str) -> Result<Grounding> {
        let query_owned = vec![query.to_string()];
        let embeddings = self
            .policy
            .execute(|| {
                let texts = &query_owned;
                async move { self.embedder.embed_batch(texts, RETRIEVAL_TASK).await }
            })
            .await?;

        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DriftError::RetrievalError("Empty embedding response".to_string()))?;

        let search_result = self
            .policy
            .execute(|| {
                let vector = embedding.clone();
                async move {
                    self.client
                        .search_points(&SearchPoints {
                            collection_name: self.collection.clone(),
                            vector,
                            limit: self.top_k,
                            with_payload: Some(WithPayloadSelector {
                                selector_options: Some(SelectorOptions::Enable(true)),
                            }),
                            ..Default::default()
                        })
                        .await
                        .map_err(|e| DriftError::RetrievalError(format!("Search failed: {}", e)))
                }
            })
            .await?;

        let mut crns = Vec::new();
        let mut contents = Vec::new();

        for point in search_result.result {
            if let Some(crn) = Self::payload_str(&point.payload, "crn") {
                crns.push(crn);
            }
            if let Some(content) = Self::payload_str(&point.payload, "content") {
                contents.push(remove_punctuation(&content));
            }
        }

        info!(query = %query, hits = crns.len(), "Semantic search complete");

        Ok(Grounding {
            crns,
            content: contents.join("\n\n"),
        })
    }
}

/// Fixed-content retriever for tests and embedded use
#[derive(Default)]
pub struct StaticRetriever {
    groundings: HashMap<String, Grounding>,
    fallback: Option<Grounding>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this grounding for any query without an explicit entry
    pub fn with_fallback(content: &str) -> Self {
        Self {
            groundings: HashMap::new(),
            fallback: Some(Grounding {
                crns: vec!["00000".to_string()],
                content: content.to_string(),
            }),
        }
    }

    /// Register a grounding for one query
    pub fn insert(&mut self, query: &str, grounding: Grounding) {
        self.groundings.insert(query.to_string(), grounding);
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn semantic_search(&self, query: &str) -> Result<Grounding> {
        self.groundings
            .get(query)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| DriftError::RetrievalError(format!("No grounding for: {}", query)))
    }
}
