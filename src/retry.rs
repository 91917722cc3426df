//! Bounded exponential-backoff retry for remote calls
//!
//! Wraps every embedding-service and generation-service call. The policy
//! retries every error uniformly; after the retry budget is spent the last
//! failure propagates to the caller unchanged.

use crate::errors::{DriftError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Maximum number of retry attempts
pub const MAX_RETRIES: u32 = 10;

/// Base delay for exponential backoff (1 second)
const BASE_DELAY_MS: u64 = 1000;

/// Maximum delay cap (32 seconds)
const MAX_DELAY_MS: u64 = 32000;

/// Base for the exponential delay curve
const EXPONENTIAL_BASE: f64 = 2.0;

/// Retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retry attempts (total attempts = max_retries + 1)
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Base for exponential calculation
    exponential_base: f64,

    /// Scale each delay by a uniform factor in [0.5, 1.5]
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Create a retry policy with default settings
    pub fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            exponential_base: EXPONENTIAL_BASE,
            jitter: true,
        }
    }

    /// Create a retry policy with custom settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            exponential_base: EXPONENTIAL_BASE,
            jitter: true,
        }
    }

    /// Disable jitter (deterministic delays)
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Execute an operation, retrying on any error up to the budget.
    ///
    /// The policy does not distinguish deterministically-invalid inputs from
    /// transient failures; both consume the same budget.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    retries += 1;
                    if retries > self.max_retries {
                        warn!(
                            max_retries = self.max_retries,
                            error = %e,
                            "Max retries exceeded"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(retries);
                    warn!(
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay before the given retry attempt (1-based)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay_ms as f64
            * self.exponential_base.powi(attempt.saturating_sub(1) as i32);

        let delay_ms = exponential.min(self.max_delay_ms as f64);

        let final_ms = if self.jitter {
            let factor = rand::random::<f64>() + 0.5;
            delay_ms * factor
        } else {
            delay_ms
        };

        Duration::from_millis(final_ms as u64)
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::with_config(max_retries, 1).without_jitter()
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let policy = fast_policy(3);

        let attempt_count = Arc::new(Mutex::new(0));
        let count_clone = attempt_count.clone();

        let result = policy
            .execute(move || {
                let count = count_clone.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Ok::<i32, DriftError>(42)
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempt_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_success_after_k_failures() {
        let policy = fast_policy(10);

        let attempt_count = Arc::new(Mutex::new(0));
        let count_clone = attempt_count.clone();

        let result = policy
            .execute(move || {
                let count = count_clone.clone();
                async move {
                    let mut attempts = count.lock().unwrap();
                    *attempts += 1;
                    let current = *attempts;
                    drop(attempts);

                    if current <= 3 {
                        Err(DriftError::Generic("transient".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
        // 3 failures then success: 4 total attempts
        assert_eq!(*attempt_count.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_always_fails_attempt_count() {
        let policy = fast_policy(3);

        let attempt_count = Arc::new(Mutex::new(0));
        let count_clone = attempt_count.clone();

        let result = policy
            .execute(move || {
                let count = count_clone.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Err::<i32, _>(DriftError::Generic("always fails".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        // max_retries + 1 total attempts
        assert_eq!(*attempt_count.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_last_error_propagates() {
        let policy = fast_policy(2);

        let result = policy
            .execute(|| async {
                Err::<i32, _>(DriftError::EmbeddingError("boom".to_string()))
            })
            .await;

        match result {
            Err(DriftError::EmbeddingError(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected EmbeddingError, got {:?}", other),
        }
    }

    #[test]
    fn test_delay_sequence_non_decreasing_and_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: 1000,
            max_delay_ms: 32000,
            exponential_base: 2.0,
            jitter: false,
        };

        let delays: Vec<u64> = (1..=10)
            .map(|n| policy.delay_for_attempt(n).as_millis() as u64)
            .collect();

        assert_eq!(delays[0], 1000);
        assert_eq!(delays[1], 2000);
        assert_eq!(delays[2], 4000);
        assert_eq!(delays[3], 8000);
        assert_eq!(delays[4], 16000);
        assert_eq!(delays[5], 32000);

        for pair in delays.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(delays.iter().all(|&d| d <= 32000));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: 1000,
            max_delay_ms: 32000,
            exponential_base: 2.0,
            jitter: true,
        };

        for _ in 0..100 {
            let d = policy.delay_for_attempt(1).as_millis() as u64;
            assert!((500..=1500).contains(&d), "jittered delay {} out of range", d);
        }
    }
}
