//! Bounded retry of provider calls.

use crate::RetryConfig;
use folio_error::{FolioError, FolioResult, ProviderError, ProviderErrorKind, RetryableError};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Retry schedule derived from [`RetryConfig`].
///
/// A factor of 1 waits `delay_ms` between every attempt. A larger factor
/// grows the wait geometrically from `delay_ms`, capped at `max_delay_ms`.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct RetryPolicy {
    /// Total attempts including the first
    #[getter(copy)]
    max_attempts: usize,
    /// Base delay
    #[getter(copy)]
    delay: Duration,
    /// Growth factor
    #[getter(copy)]
    factor: u64,
    /// Delay ceiling
    #[getter(copy)]
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts().max(1),
            delay: Duration::from_millis(config.delay_ms()),
            factor: config.backoff_factor().max(1),
            max_delay: Duration::from_millis(config.max_delay_ms()),
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt.
    pub fn none() -> Self {
        Self::from(&RetryConfig::immediate(1))
    }

    /// Delays between attempts, one fewer than the attempt count.
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        if self.factor <= 1 {
            FixedInterval::new(self.delay).take(retries).collect()
        } else {
            let ceiling = self.max_delay.max(self.delay);
            let factor = u32::try_from(self.factor).unwrap_or(u32::MAX);
            std::iter::successors(Some(self.delay), |d| d.checked_mul(factor))
                .map(|d| d.min(ceiling))
                .chain(std::iter::repeat(ceiling))
                .take(retries)
                .collect()
        }
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// Only provider errors classified as retryable are retried. When the
    /// last attempt fails with a retryable error the result is
    /// `ProviderErrorKind::RetriesExhausted` naming the attempt count.
    pub async fn run<F, Fut, T>(&self, operation: F) -> FolioResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FolioResult<T>>,
    {
        let attempts = AtomicUsize::new(0);

        let result = Retry::spawn(self.delays(), || async {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match operation().await {
                Ok(value) => Ok(value),
                Err(e) if is_retryable(&e) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Transient error, will retry"
                    );
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await;

        result.map_err(|e| exhausted(e, attempts.load(Ordering::SeqCst)))
    }
}

fn is_retryable(err: &FolioError) -> bool {
    err.as_provider().is_some_and(RetryableError::is_retryable)
}

fn exhausted(err: FolioError, attempts: usize) -> FolioError {
    match err.as_provider() {
        Some(provider_err) if provider_err.is_retryable() => ProviderError::new(
            provider_err.provider.clone(),
            ProviderErrorKind::RetriesExhausted {
                attempts,
                last: Box::new(provider_err.kind.clone()),
            },
        )
        .into(),
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delays() {
        let policy = RetryPolicy::from(&RetryConfig::new(5, 10_000, 1, 60_000));
        let delays = policy.delays();
        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[test]
    fn test_exponential_delays_grow_and_cap() {
        let policy = RetryPolicy::from(&RetryConfig::new(6, 1_000, 2, 5_000));
        let delays = policy.delays();
        assert_eq!(delays.len(), 5);
        assert_eq!(delays[0], Duration::from_millis(1_000));
        assert_eq!(delays[1], Duration::from_millis(2_000));
        assert_eq!(delays[2], Duration::from_millis(4_000));
        assert_eq!(delays[3], Duration::from_millis(5_000));
        assert_eq!(delays[4], Duration::from_millis(5_000));
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert!(RetryPolicy::none().delays().is_empty());
    }
}
