//! Drift detection core: similarity math, band derivation, classification

pub mod detector;
pub mod similarity;
pub mod threshold;

pub use detector::{DriftDetector, DriftReport};
pub use threshold::{SimilarityBand, ThresholdEngine};
