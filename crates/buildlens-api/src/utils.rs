//! Common utilities for transport implementations

use std::time::Duration;

use crate::{
    LensError,
    LensResult,
};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_retries: usize,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Whether to use exponential backoff
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(50),
            exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_delay: Duration, exponential_backoff: bool) -> Self {
        Self {
            max_retries,
            initial_delay,
            exponential_backoff,
        }
    }

    /// Executes an operation, retrying transient failures
    ///
    /// Only [`LensError::is_transient`] errors are retried; authentication
    /// and not-found failures are returned on the first occurrence.
    pub async fn retry<F, Fut, T>(&self, operation: F) -> LensResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LensResult<T>>,
    {
        let attempts = self.max_retries.max(1);
        let mut delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 0..attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < attempts - 1 && e.is_transient() => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "retrying request");
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                    if self.exponential_backoff {
                        delay *= 2;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| LensError::NetworkError("Max retries exceeded".to_string())))
    }
}
