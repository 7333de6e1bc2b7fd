//! Generation pipeline errors.

/// Conditions that abort a chapter, a scan or the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// A provider call could not be recovered
    #[display("Fatal error during {} with provider '{}': {}", stage, provider, message)]
    Fatal {
        /// Pipeline stage, e.g. "chapter 2 fragment 3"
        stage: String,
        /// Provider that failed
        provider: String,
        /// Underlying failure
        message: String,
    },
    /// A stage requiring at least one provider had none
    #[display("No providers configured for {}", stage)]
    NoProviders {
        /// Pipeline stage that needed providers
        stage: String,
    },
    /// Run parameters are unusable
    #[display("Invalid configuration: {}", _0)]
    InvalidConfiguration(String),
}

/// Error type for the generation and scan pipeline.
///
/// # Examples
///
/// ```
/// use folio_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::NoProviders {
///     stage: "pattern scan".to_string(),
/// });
/// assert!(format!("{}", err).contains("pattern scan"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Fatal failure of one stage against one provider.
    #[track_caller]
    pub fn fatal(
        stage: impl Into<String>,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(GenerationErrorKind::Fatal {
            stage: stage.into(),
            provider: provider.into(),
            message: message.into(),
        })
    }
}
