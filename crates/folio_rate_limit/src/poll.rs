//! Waiting on asynchronously completing jobs.

use crate::PollingConfig;
use folio_core::JobStatus;
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bounded status polling at a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct PollPolicy {
    /// Pause between status queries
    #[getter(copy)]
    interval: Duration,
    /// Queries before giving up
    #[getter(copy)]
    max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms()),
            max_polls: config.max_polls().max(1),
        }
    }
}

impl PollPolicy {
    /// Poll with no interval, for tests.
    pub fn immediate(max_polls: u32) -> Self {
        Self::from(&PollingConfig::new(0, max_polls))
    }

    /// Query `check` until it reports a terminal status.
    ///
    /// Returns the terminal status, whatever it is; callers decide whether a
    /// non-success terminal state is an error. Gives up with
    /// `ProviderErrorKind::PollTimeout` after `max_polls` queries.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `check`.
    #[instrument(skip(self, check), fields(max_polls = self.max_polls))]
    pub async fn until_terminal<F, Fut>(
        &self,
        provider: &str,
        mut check: F,
    ) -> FolioResult<JobStatus>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FolioResult<JobStatus>>,
    {
        for poll in 1..=self.max_polls {
            let status = check().await?;
            if status.is_terminal() {
                debug!(poll, %status, "Job reached terminal state");
                return Ok(status);
            }
            debug!(poll, %status, "Job still running");
            if poll < self.max_polls && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(ProviderError::new(
            provider,
            ProviderErrorKind::PollTimeout {
                polls: self.max_polls,
            },
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_returns_first_terminal_status() {
        let calls = AtomicU32::new(0);
        let status = PollPolicy::immediate(10)
            .until_terminal("assistants", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(if n < 2 {
                    JobStatus::InProgress
                } else {
                    JobStatus::Failed
                })
            })
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_polls() {
        let err = PollPolicy::immediate(4)
            .until_terminal("assistants", || async { Ok(JobStatus::Queued) })
            .await
            .unwrap_err();
        let provider_err = err.as_provider().unwrap();
        assert_eq!(provider_err.kind, ProviderErrorKind::PollTimeout { polls: 4 });
    }
}
