//! Drift classification of live queries against the train population
//!
//! A query drifts when its closest-train-neighbor similarity falls strictly
//! inside the band: close enough to be plausibly in-domain, far enough to be
//! novel. Similarities above the band are well-covered queries; below it,
//! likely out-of-domain noise.

use crate::drift::similarity;
use crate::drift::threshold::SimilarityBand;
use crate::history::DriftEvent;
use chrono::{DateTime, Utc};
use tracing::info;

/// Outcome of one detection pass
#[derive(Debug, Clone)]
pub struct DriftReport {
    /// Drift candidates, in test-population order
    pub events: Vec<DriftEvent>,
}

impl DriftReport {
    /// True when at least one query drifted this run
    pub fn any_drift(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Classifies test embeddings against the train set and band
#[derive(Debug, Clone)]
pub struct DriftDetector {
    band: SimilarityBand,
}

impl DriftDetector {
    /// Create a detector for the given per-run band
    pub fn new(band: SimilarityBand) -> Self {
        Self { band }
    }

    /// Classify every test query; similarity is computed against the full
    /// train set, not batch-local subsets.
    pub fn detect(
        &self,
        test_queries: &[String],
        test_embeddings: &[Vec<f32>],
        train_embeddings: &[Vec<f32>],
        run_time: DateTime<Utc>,
    ) -> DriftReport {
        let mut events = Vec::new();

        for (query, embedding) in test_queries.iter().zip(test_embeddings.iter()) {
            let Some(min_similarity) = similarity::min_against(embedding, train_embeddings)
            else {
                continue;
            };

            if self.band.contains(min_similarity) {
                events.push(DriftEvent {
                    query: query.clone(),
                    similarity: min_similarity,
                    timestamp: run_time,
                });
            }
        }

        if events.is_empty() {
            info!("No data drift detected");
        } else {
            info!(count = events.len(), "Data drift detected");
            for event in &events {
                info!(query = %event.query, similarity = event.similarity, "Drift query");
            }
        }

        DriftReport { events }
    }

    /// The band this detector classifies against
    pub fn band(&self) -> SimilarityBand {
        self.band
    }
}
