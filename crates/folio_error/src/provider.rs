//! Provider call errors and retry classification.

/// Provider-level error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Network failure, timeout or rate limit
    #[display("Transient provider failure: {}", _0)]
    Transient(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status, message)]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },
    /// Payload was empty, null or not parseable
    #[display("Malformed response: {}", _0)]
    Malformed(String),
    /// API key environment variable not set
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// Operation not offered by this provider
    #[display("Unsupported operation: {}", _0)]
    Unsupported(String),
    /// An asynchronous job ended in a non-success terminal state
    #[display("Generation job ended with status '{}'", status)]
    JobFailed {
        /// Terminal status reported by the provider
        status: String,
    },
    /// Polling gave up before the job reached a terminal state
    #[display("Job did not finish after {} polls", polls)]
    PollTimeout {
        /// Number of status queries issued
        polls: u32,
    },
    /// Every retry attempt failed
    #[display("Retries exhausted after {} attempts: {}", attempts, last)]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: usize,
        /// The final failure
        last: Box<ProviderErrorKind>,
    },
}

impl ProviderErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::Transient(_) | ProviderErrorKind::Malformed(_) => true,
            ProviderErrorKind::Http { status, .. } => {
                matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ProviderErrorKind::PollTimeout { .. } => true,
            _ => false,
        }
    }

    /// Whether the failure concerns the shape of the payload rather than transport.
    pub fn is_malformed(&self) -> bool {
        match self {
            ProviderErrorKind::Malformed(_) => true,
            ProviderErrorKind::RetriesExhausted { last, .. } => last.is_malformed(),
            _ => false,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use folio_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new("openai", ProviderErrorKind::MissingApiKey("OPENAI_API_KEY".into()));
/// assert!(format!("{}", err).contains("OPENAI_API_KEY"));
/// assert_eq!(err.provider, "openai");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error [{}]: {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    /// Provider that produced the error
    pub provider: String,
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a transient failure.
    #[track_caller]
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Transient(message.into()))
    }

    /// Shorthand for a malformed payload.
    #[track_caller]
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Malformed(message.into()))
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use folio_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new("gemini", ProviderErrorKind::Http {
///     status: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = ProviderError::new("gemini", ProviderErrorKind::Http {
///     status: 401,
///     message: "Unauthorized".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like 503 (service unavailable), 429 (rate limit),
    /// network timeouts or malformed payloads return true. Permanent errors
    /// like 401 (unauthorized) or 400 (bad request) return false.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_keeps_last_kind() {
        let kind = ProviderErrorKind::RetriesExhausted {
            attempts: 3,
            last: Box::new(ProviderErrorKind::Malformed("empty body".into())),
        };
        assert!(kind.is_malformed());
        assert_eq!(
            kind.to_string(),
            "Retries exhausted after 3 attempts: Malformed response: empty body"
        );

        // Wording alone does not make a failure malformed
        let kind = ProviderErrorKind::RetriesExhausted {
            attempts: 3,
            last: Box::new(ProviderErrorKind::Transient("Malformed gateway reply".into())),
        };
        assert!(!kind.is_malformed());
    }
}
