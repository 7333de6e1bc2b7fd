//! Configuration for retry, pacing and polling.
//!
//! These sections are deserialized from the `[retry]`, `[pacing]` and
//! `[polling]` tables of `folio.toml`. Every field has a default so an
//! empty table (or none at all) yields the standard call policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_attempts() -> usize {
    5
}

fn default_retry_delay_ms() -> u64 {
    10_000
}

fn default_backoff_factor() -> u64 {
    1
}

fn default_max_delay_ms() -> u64 {
    120_000
}

fn default_post_call_delay_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_polls() -> u32 {
    600
}

/// Bounded retry for failed provider calls.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_attempts = 5
/// delay_ms = 10000
/// backoff_factor = 1   # 1 = fixed delay, >1 = exponential
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct RetryConfig {
    /// Total attempts including the first call
    #[serde(default = "default_max_attempts")]
    #[getter(copy)]
    max_attempts: usize,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    #[getter(copy)]
    delay_ms: u64,

    /// Growth base between retries; 1 keeps the delay fixed
    #[serde(default = "default_backoff_factor")]
    #[getter(copy)]
    backoff_factor: u64,

    /// Upper bound for any single delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    #[getter(copy)]
    max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration.
    pub fn new(
        max_attempts: usize,
        delay_ms: u64,
        backoff_factor: u64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            max_attempts,
            delay_ms,
            backoff_factor,
            max_delay_ms,
        }
    }

    /// Retry configuration that never waits, for tests.
    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, 0, 1, 0)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a message if no attempt would ever be made.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Mandatory pause after every successful provider call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct PacingConfig {
    /// Pause in milliseconds
    #[serde(default = "default_post_call_delay_ms")]
    #[getter(copy)]
    post_call_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            post_call_delay_ms: default_post_call_delay_ms(),
        }
    }
}

impl PacingConfig {
    /// Create a pacing configuration.
    pub fn new(post_call_delay_ms: u64) -> Self {
        Self { post_call_delay_ms }
    }

    /// The pause as a duration.
    pub fn post_call_delay(&self) -> Duration {
        Duration::from_millis(self.post_call_delay_ms)
    }
}

/// Completion polling for asynchronous generation jobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct PollingConfig {
    /// Interval between status queries in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    #[getter(copy)]
    interval_ms: u64,

    /// Status queries before giving up
    #[serde(default = "default_max_polls")]
    #[getter(copy)]
    max_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

impl PollingConfig {
    /// Create a polling configuration.
    pub fn new(interval_ms: u64, max_polls: u32) -> Self {
        Self {
            interval_ms,
            max_polls,
        }
    }
}
