//! Training-sample synthesis for escalated queries
//!
//! Each escalated query is grounded through semantic search and answered by
//! the generation service; the resulting (question, context, response)
//! triples become the next training batch. The loop is bounded by a sample
//! quota: the first item processed after the quota fills is dropped and ends
//! the loop. A failed retrieval or generation call fails the whole run.

pub mod generator;

use crate::errors::Result;
use crate::retrieval::Retriever;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use generator::{GenerationClient, GenerationConfig, Generator};

/// One synthesized training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub question: String,
    pub context: String,
    pub response: String,
}

/// Build the fixed generation prompt for a query and its grounding content
pub fn build_prompt(query: &str, content: &str) -> String {
    format!(
        "Given the user question and the relevant information from the database, \
craft a concise and informative response:\n\
User Question:\n\
{query}\n\
Context:\n\
{content}\n\
The response should:\n\
1. Highlight the main topics and unique aspects of the course content.\n\
2. Summarize the instructor's teaching style and notable strengths or weaknesses.\n\
3. Clearly address potential benefits and challenges of the course, providing a \
straightforward recommendation as needed.\n\
Ensure the answer is direct, informative, and relevant to the user's question."
    )
}

/// Quota-bounded sample synthesizer
pub struct SampleSynthesizer {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    policy: RetryPolicy,
    quota: usize,
}

impl SampleSynthesizer {
    /// Create a synthesizer with the given sample quota
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        policy: RetryPolicy,
        quota: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            policy,
            quota,
        }
    }

    /// Synthesize samples for the escalated queries, in the order they were
    /// escalated, up to the quota.
    pub async fn synthesize(&self, queries: &[String]) -> Result<Vec<TrainingSample>> {
        let mut samples: Vec<TrainingSample> = Vec::new();

        for query in queries {
            let grounding = self.retriever.semantic_search(query).await?;
            let prompt = build_prompt(query, &grounding.content);

            let prompt_ref = &prompt;
            let response = self
                .policy
                .execute(|| async move { self.generator.generate(prompt_ref).await })
                .await?;

            if samples.len() >= self.quota {
                // Quota already satisfied; drop this sample and halt.
                break;
            }

            samples.push(TrainingSample {
                question: query.clone(),
                context: grounding.content,
                response,
            });
            info!(generated = samples.len(), "Generated samples");
        }

        info!(total = samples.len(), "Sample synthesis complete");
        Ok(samples)
    }

    /// Serialize the batch as one JSON artifact, replacing any existing
    /// artifact at the target path.
    pub fn write_artifact(samples: &[TrainingSample], path: &Path) -> Result<()> {
        if path.exists() {
            info!(path = %path.display(), "Existing artifact found, removing");
            fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(samples)?;
        fs::write(path, json)?;
        info!(path = %path.display(), rows = samples.len(), "Wrote training artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DriftError;
    use crate::retrieval::StaticRetriever;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Echoes the prompt length and counts calls
    #[derive(Default)]
    struct CountingGenerator {
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(DriftError::GenerationError("unavailable".to_string()));
            }
            Ok(format!("response for {} chars", prompt.len()))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::with_config(2, 1).without_jitter()
    }

    fn queries(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("query {}", i)).collect()
    }

    #[tokio::test]
    async fn test_synthesize_under_quota() {
        let generator = Arc::new(CountingGenerator::default());
        let synthesizer = SampleSynthesizer::new(
            Arc::new(StaticRetriever::with_fallback("course info")),
            generator.clone(),
            fast_policy(),
            50,
        );

        let samples = synthesizer.synthesize(&queries(3)).await.unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(*generator.calls.lock().unwrap(), 3);
        assert_eq!(samples[0].question, "query 0");
        assert_eq!(samples[0].context, "course info");
    }

    #[tokio::test]
    async fn test_quota_halts_after_first_over_quota_item() {
        let generator = Arc::new(CountingGenerator::default());
        let synthesizer = SampleSynthesizer::new(
            Arc::new(StaticRetriever::with_fallback("course info")),
            generator.clone(),
            fast_policy(),
            2,
        );

        let samples = synthesizer.synthesize(&queries(5)).await.unwrap();
        // Exactly quota rows; the third item is processed, dropped, and
        // halts the loop. The remaining two are never touched.
        assert_eq!(samples.len(), 2);
        assert_eq!(*generator.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_order_follows_escalation_order() {
        let synthesizer = SampleSynthesizer::new(
            Arc::new(StaticRetriever::with_fallback("course info")),
            Arc::new(CountingGenerator::default()),
            fast_policy(),
            50,
        );

        let samples = synthesizer
            .synthesize(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(samples[0].question, "b");
        assert_eq!(samples[1].question, "a");
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal() {
        let generator = Arc::new(CountingGenerator {
            calls: Mutex::new(0),
            fail: true,
        });
        let synthesizer = SampleSynthesizer::new(
            Arc::new(StaticRetriever::with_fallback("course info")),
            generator.clone(),
            fast_policy(),
            50,
        );

        let result = synthesizer.synthesize(&queries(3)).await;
        assert!(result.is_err());
        // 1 attempt + 2 retries on the first query, nothing after
        assert_eq!(*generator.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_fatal() {
        let synthesizer = SampleSynthesizer::new(
            Arc::new(StaticRetriever::new()),
            Arc::new(CountingGenerator::default()),
            fast_policy(),
            50,
        );

        assert!(synthesizer.synthesize(&queries(1)).await.is_err());
    }

    #[test]
    fn test_prompt_embeds_query_and_content() {
        let prompt = build_prompt("is cs5200 worth taking?", "Course Information here");
        assert!(prompt.contains("is cs5200 worth taking?"));
        assert!(prompt.contains("Course Information here"));
        assert!(prompt.contains("teaching style"));
    }

    #[test]
    fn test_artifact_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("llm_train_data.json");

        fs::write(&path, "stale contents").unwrap();

        let samples = vec![TrainingSample {
            question: "q".to_string(),
            context: "c".to_string(),
            response: "r".to_string(),
        }];
        SampleSynthesizer::write_artifact(&samples, &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: Vec<TrainingSample> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, samples);
    }

    #[test]
    fn test_artifact_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tmp").join("llm_train_data.json");

        SampleSynthesizer::write_artifact(&[], &path).unwrap();
        assert!(path.exists());
    }
}
