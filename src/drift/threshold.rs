//! Adaptive similarity-band derivation from the train query population
//!
//! The scan is batched: only similarities *within* each fixed-size batch are
//! compared, and the running minimum across batches becomes `minimum_sim`.
//! This understates the true global minimum but is kept for behavioral
//! parity with the deployed pipeline.

use crate::drift::similarity;
use crate::errors::{DriftError, Result};
use serde::{Deserialize, Serialize};

/// Immutable per-run similarity band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBand {
    pub upper_threshold: f32,
    pub lower_threshold: f32,
}

impl SimilarityBand {
    /// True when the similarity falls strictly inside the band
    pub fn contains(&self, similarity: f32) -> bool {
        similarity > self.lower_threshold && similarity < self.upper_threshold
    }
}

/// Derives the similarity band from train embeddings
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    batch_size: usize,
    upper_factor: f32,
    lower_factor: f32,
}

impl Default for ThresholdEngine {
    fn default() -> Self {
        Self::new(4, 0.1, 0.6)
    }
}

impl ThresholdEngine {
    /// Create an engine with the given batch size and band factors
    pub fn new(batch_size: usize, upper_factor: f32, lower_factor: f32) -> Self {
        Self {
            batch_size: batch_size.max(1),
            upper_factor,
            lower_factor,
        }
    }

    /// Derive the band from the full train embedding set.
    ///
    /// Fails on an empty set and on a band that does not satisfy
    /// `lower < upper` (both structural, never retried).
    pub fn derive(&self, train_embeddings: &[Vec<f32>]) -> Result<SimilarityBand> {
        if train_embeddings.is_empty() {
            return Err(DriftError::EmptyTrainSet);
        }

        let mut minimum_sim = f32::INFINITY;
        for batch in train_embeddings.chunks(self.batch_size) {
            if let Some(batch_min) = similarity::pairwise_min(batch) {
                minimum_sim = minimum_sim.min(batch_min);
            }
        }

        let upper_threshold = minimum_sim - minimum_sim * self.upper_factor;
        let lower_threshold = minimum_sim - minimum_sim * self.lower_factor;

        if !upper_threshold.is_finite()
            || !lower_threshold.is_finite()
            || lower_threshold >= upper_threshold
        {
            return Err(DriftError::MalformedBand {
                lower: lower_threshold,
                upper: upper_threshold,
            });
        }

        Ok(SimilarityBand {
            upper_threshold,
            lower_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn test_empty_train_set_rejected() {
        let engine = ThresholdEngine::default();
        let result = engine.derive(&[]);
        assert!(matches!(result, Err(DriftError::EmptyTrainSet)));
    }

    #[test]
    fn test_band_from_known_minimum() {
        // Two orthogonal-ish vectors at 60 degrees: cos = 0.5
        let engine = ThresholdEngine::new(4, 0.1, 0.6);
        let train = vec![
            vec![1.0, 0.0],
            vec![0.5, 3.0f32.sqrt() / 2.0],
        ];

        let band = engine.derive(&train).unwrap();
        assert!((band.upper_threshold - 0.45).abs() < 1e-5);
        assert!((band.lower_threshold - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_batching_limits_comparisons() {
        // The dissimilar pair is split across batches of 2, so the scan
        // never compares them; each batch's minimum is its self-similarity
        // or a near-1 pairing.
        let engine = ThresholdEngine::new(2, 0.1, 0.6);
        let train = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.05],
            vec![0.0, 1.0],
            vec![0.05, 0.99],
        ];

        let band = engine.derive(&train).unwrap();
        // Within-batch minima are both close to 1.0; a global all-pairs scan
        // would have found ~0.0 instead.
        assert!(band.upper_threshold > 0.8);
    }

    #[test]
    fn test_single_embedding_band() {
        // One vector: within-batch minimum is the self-similarity 1.0
        let engine = ThresholdEngine::new(4, 0.1, 0.6);
        let band = engine.derive(&[vec![3.0, 4.0]]).unwrap();
        assert!((band.upper_threshold - 0.9).abs() < 1e-5);
        assert!((band.lower_threshold - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_band_contains_is_strict() {
        let band = SimilarityBand {
            upper_threshold: 0.45,
            lower_threshold: 0.2,
        };
        assert!(band.contains(0.3));
        assert!(!band.contains(0.45));
        assert!(!band.contains(0.2));
        assert!(!band.contains(0.5));
        assert!(!band.contains(0.1));
    }

    quickcheck! {
        fn prop_band_ordering_for_positive_minimum(min_sim: f32) -> TestResult {
            // The formula guarantees lower < upper whenever the scanned
            // minimum is positive; non-positive minima are rejected as
            // malformed by derive().
            if !min_sim.is_finite() || min_sim <= 0.0 || min_sim > 1.0 {
                return TestResult::discard();
            }
            let upper = min_sim - min_sim * 0.1;
            let lower = min_sim - min_sim * 0.6;
            TestResult::from_bool(lower < upper)
        }
    }

    #[test]
    fn test_negative_minimum_yields_malformed_band() {
        // Opposite vectors in one batch: minimum_sim = -1, which inverts
        // the band ordering and must fail fast.
        let engine = ThresholdEngine::new(4, 0.1, 0.6);
        let train = vec![vec![1.0, 0.0], vec![-1.0, 0.0]];
        let result = engine.derive(&train);
        assert!(matches!(result, Err(DriftError::MalformedBand { .. })));
    }
}
