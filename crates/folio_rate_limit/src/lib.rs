//! Call policy for provider adapters.
//!
//! Every provider call goes through a [`CallPolicy`]: calls run one at a
//! time, each success is followed by a mandatory pause, and retryable
//! failures are retried on a bounded schedule. Jobs that finish
//! asynchronously are awaited with a [`PollPolicy`].
//!
//! ```rust,ignore
//! use folio_rate_limit::{CallPolicy, PacingConfig, RetryConfig};
//!
//! let policy = CallPolicy::new(&RetryConfig::default(), &PacingConfig::default(), Some(60));
//! let reply = policy.execute(|| async { client.send(&body).await }).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod policy;
mod poll;
mod retry;

pub use config::{PacingConfig, PollingConfig, RetryConfig};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use policy::CallPolicy;
pub use poll::PollPolicy;
pub use retry::RetryPolicy;
