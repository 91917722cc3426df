//! Error types for the driftwatch pipeline
//!
//! Distinguishes transient remote failures (retried by the backoff policy)
//! from structural failures that fail the run immediately.

use thiserror::Error;

/// Main error type for the drift-detection pipeline
#[derive(Error, Debug)]
pub enum DriftError {
    /// Embedding service errors
    #[error("Embedding service error: {0}")]
    EmbeddingError(String),

    /// Generation service errors
    #[error("Generation service error: {0}")]
    GenerationError(String),

    /// Retrieval / vector search errors
    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    /// Drift history store errors
    #[error("Drift history error: {0}")]
    HistoryError(String),

    /// Artifact storage errors
    #[error("Artifact storage error: {0}")]
    StorageError(String),

    /// Threshold derivation requires a non-empty train set
    #[error("Cannot derive similarity band: train embedding set is empty")]
    EmptyTrainSet,

    /// Embedding dimension did not match the expected width
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Derived band failed the lower < upper invariant
    #[error("Malformed similarity band: lower {lower} must be below upper {upper}")]
    MalformedBand { lower: f32, upper: f32 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Pipeline error: {0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DriftError>;

/// Convert anyhow errors to DriftError
impl From<anyhow::Error> for DriftError {
    fn from(err: anyhow::Error) -> Self {
        DriftError::Generic(err.to_string())
    }
}
