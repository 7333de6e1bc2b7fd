//! Revision pass errors.

/// Decision-input failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RevisionErrorKind {
    /// Operator picked an option that does not exist
    #[display("Invalid decision: {}", _0)]
    InvalidDecision(String),
    /// A scripted source ran out of decisions
    #[display("Decision source has no more decisions")]
    DecisionSourceExhausted,
    /// Too many consecutive invalid inputs
    #[display("Gave up after {} invalid decisions", _0)]
    TooManyInvalidDecisions(u32),
}

/// Error type for the revision engine and decision sources.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Revision Error: {} at line {} in {}", kind, line, file)]
pub struct RevisionError {
    /// The specific error condition
    pub kind: RevisionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl RevisionError {
    /// Create a new RevisionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RevisionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the caller should ask again.
    pub fn is_invalid_decision(&self) -> bool {
        matches!(self.kind, RevisionErrorKind::InvalidDecision(_))
    }
}
