//! driftwatch - Query-Drift Detection & Adaptive Retraining
//!
//! Decides whether recently observed user queries have semantically
//! diverged from the training query distribution of a retrieval-augmented
//! course-QA system, and if a trend emerges, synthesizes new training
//! samples and triggers retraining.
//!
//! # Architecture
//!
//! - Embeddings are fetched in fixed-size batches behind a backoff-retry
//!   policy.
//! - A similarity band is derived per run from the train population; live
//!   queries landing strictly inside the band are recorded as drift events.
//! - A rolling window over the drift history, floored at the last
//!   retraining trigger, escalates recurring drift to sample synthesis.

pub mod errors;
pub mod config;
pub mod retry;
pub mod embedding;
pub mod drift;
pub mod history;
pub mod trend;
pub mod retrieval;
pub mod synthesis;
pub mod storage;
pub mod queries;
pub mod telemetry;
pub mod pipeline;
pub mod cli;

// Re-export commonly used types
pub use errors::{DriftError, Result};
pub use pipeline::{DriftPipeline, RunOutcome, RunReport};
