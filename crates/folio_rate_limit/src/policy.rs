//! Retry and pacing combined into one call policy.

use crate::{PacingConfig, RateLimiter, RetryConfig, RetryPolicy};
use folio_error::FolioResult;
use std::future::Future;

/// How every provider call is issued.
///
/// Each attempt waits for the limiter, runs the operation, and on success
/// holds the post-call pause before returning. Failed attempts release the
/// slot immediately and are retried according to the [`RetryPolicy`].
///
/// # Example
///
/// ```rust,ignore
/// let policy = CallPolicy::new(&RetryConfig::default(), &PacingConfig::default(), None);
/// let text = policy.execute(|| async { client.complete(&request).await }).await?;
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct CallPolicy {
    /// Retry schedule
    retry: RetryPolicy,
    /// Sequential pacing
    limiter: RateLimiter,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default(), &PacingConfig::default(), None)
    }
}

impl CallPolicy {
    /// Create a policy from configuration and an optional RPM cap.
    pub fn new(retry: &RetryConfig, pacing: &PacingConfig, rpm: Option<u32>) -> Self {
        Self {
            retry: RetryPolicy::from(retry),
            limiter: RateLimiter::new(pacing, rpm),
        }
    }

    /// Policy with no waits at all, keeping the attempt budget.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            retry: RetryPolicy::from(&RetryConfig::immediate(max_attempts)),
            limiter: RateLimiter::unpaced(),
        }
    }

    /// Execute an operation with pacing and automatic retry.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> FolioResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FolioResult<T>>,
    {
        self.retry
            .run(|| async {
                let guard = self.limiter.acquire().await;
                let result = operation().await;
                if result.is_ok() {
                    guard.complete().await;
                }
                result
            })
            .await
    }
}
