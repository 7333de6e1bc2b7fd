//! Call pacing using governor and a Tokio semaphore.
//!
//! Provider calls are issued one at a time. The limiter enforces that with a
//! single-permit semaphore, optionally caps requests per minute with a GCRA
//! limiter from `governor`, and holds every successful call's slot for the
//! configured post-call pause before releasing it.

use crate::PacingConfig;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Sequential call limiter with post-call pacing.
///
/// Cloning shares the underlying limiter, so every clone paces the same
/// provider.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = RateLimiter::new(&PacingConfig::default(), Some(60));
/// let guard = limiter.acquire().await;
/// let text = client.call().await?;
/// guard.complete().await; // pause, then release
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    slot: Arc<Semaphore>,
    post_call_delay: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rpm_limited", &self.rpm_limiter.is_some())
            .field("post_call_delay", &self.post_call_delay)
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter from pacing configuration and an optional RPM cap.
    pub fn new(pacing: &PacingConfig, rpm: Option<u32>) -> Self {
        let rpm_limiter = rpm.and_then(NonZeroU32::new).map(|n| {
            let quota = Quota::per_minute(n);
            Arc::new(GovernorRateLimiter::direct(quota))
        });

        Self {
            rpm_limiter,
            slot: Arc::new(Semaphore::new(1)),
            post_call_delay: pacing.post_call_delay(),
        }
    }

    /// Limiter with no pause and no RPM cap.
    pub fn unpaced() -> Self {
        Self::new(&PacingConfig::new(0), None)
    }

    /// The pause held after each successful call.
    pub fn post_call_delay(&self) -> Duration {
        self.post_call_delay
    }

    /// Wait for the call slot and RPM quota.
    pub async fn acquire(&self) -> RateLimiterGuard {
        // The semaphore is owned by this limiter and never closed, so
        // acquisition only fails after a close we never issue.
        let permit = match self.slot.clone().acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => None,
        };

        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        RateLimiterGuard {
            _permit: permit,
            post_call_delay: self.post_call_delay,
        }
    }
}

/// Holds the call slot until dropped or completed.
pub struct RateLimiterGuard {
    _permit: Option<OwnedSemaphorePermit>,
    post_call_delay: Duration,
}

impl RateLimiterGuard {
    /// Pause for the post-call delay, then release the slot.
    pub async fn complete(self) {
        if !self.post_call_delay.is_zero() {
            trace!(delay_ms = self.post_call_delay.as_millis() as u64, "Post-call pause");
            tokio::time::sleep(self.post_call_delay).await;
        }
    }
}
