use std::future::Future;

use crate::core::config::RetryConfig;
use crate::core::error::Result;

/// Bounded retry with exponential backoff for outbound provider calls.
///
/// Only errors classified as retryable are retried; validation and
/// not-found errors surface immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        operation = op_name,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> std::time::Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .base_delay
            .saturating_mul(factor)
            .min(self.config.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::core::error::AppError;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        })
    }

    #[tokio::test]
    async fn test_succeeds_without_retry() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result: Result<u32> = policy
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_failures_until_success() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result: Result<&str> = policy
            .run("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AppError::ExternalServiceError("transient".to_string()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = fast_policy(3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::ExternalServiceError("down".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_surface_immediately() {
        let policy = fast_policy(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Validation("bad input".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(5000),
        });

        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(5000));
        assert_eq!(policy.backoff_delay(9), Duration::from_millis(5000));
    }
}
