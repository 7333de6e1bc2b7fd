//! Provider sessions and their memory handles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a provider keeps conversational state for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryHandle {
    /// State lives only in the explicit transcript carried by the session
    #[display("transcript")]
    Transcript,
    /// Provider-native conversation thread
    #[display("thread {}", id)]
    Thread {
        /// Provider thread identifier
        id: String,
    },
    /// Provider-side cached reference material
    #[display("cache {}", name)]
    Cache {
        /// Provider cache resource name
        name: String,
    },
}

/// One provider's conversational state for one chapter.
///
/// Sessions are opened at chapter start and closed at chapter end; they are
/// never reused across chapters.
///
/// # Examples
///
/// ```
/// use folio_core::{MemoryHandle, ProviderSession};
///
/// let session = ProviderSession::new("openai", MemoryHandle::Transcript, "Outline: ...");
/// assert!(session.transcript().is_empty());
/// assert!(session.expires_at().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProviderSession {
    /// Provider that owns the session
    provider: String,
    /// Opaque provider-side memory reference
    handle: MemoryHandle,
    /// Reference material (outline and instructions) loaded at session start
    reference: String,
    /// Accumulated fragment history for providers without native memory
    transcript: String,
    /// When provider-side cached state lapses
    expires_at: Option<DateTime<Utc>>,
}

impl ProviderSession {
    /// Create a session with an empty transcript.
    pub fn new(
        provider: impl Into<String>,
        handle: MemoryHandle,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            handle,
            reference: reference.into(),
            transcript: String::new(),
            expires_at: None,
        }
    }

    /// Set the expiry of provider-side state.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether provider-side state has lapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Append text to the transcript.
    pub fn append_transcript(&mut self, text: &str) {
        self.transcript.push_str(text);
    }
}

/// Status of an asynchronously completing generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to start
    Queued,
    /// Running
    InProgress,
    /// Blocked on caller input
    RequiresAction,
    /// Cancellation requested but not finished
    Cancelling,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled before finishing
    Cancelled,
    /// Ran out of time on the provider side
    Expired,
    /// Ended without a full result
    Incomplete,
    /// A status this crate does not know
    #[strum(default)]
    Other(String),
}

impl JobStatus {
    /// Whether polling should stop.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_core::JobStatus;
    /// use std::str::FromStr;
    ///
    /// assert!(JobStatus::from_str("completed").unwrap().is_terminal());
    /// assert!(!JobStatus::from_str("in_progress").unwrap().is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::Failed
                | JobStatus::Cancelled
                | JobStatus::Expired
                | JobStatus::Incomplete
        )
    }

    /// Whether the job produced a usable result.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}
