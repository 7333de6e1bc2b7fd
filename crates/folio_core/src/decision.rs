//! Revision decisions and the requests that prompt them.

use crate::{Match, MatchGroup};
use serde::{Deserialize, Serialize};

/// How far a decision reaches.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DecisionScope {
    /// Applies to one match
    #[default]
    SingleMatch,
    /// Applies to every match of one pattern
    Group,
    /// Applies to every match in the pass
    Global,
}

/// Replacement for a changed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChangeSpec {
    /// Substitute this text for the sentence
    Literal {
        /// Replacement text
        text: String,
    },
    /// Ask a provider to rewrite the sentence
    Rewrite {
        /// Free-text guidance for the rewrite, may be empty
        instruction: String,
    },
}

/// What to do with a matched sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RevisionOperation {
    /// Leave the sentence as is
    #[display("keep")]
    Keep,
    /// Replace the sentence
    #[display("change")]
    Change(ChangeSpec),
    /// Remove the sentence
    #[display("delete")]
    Delete,
}

/// An operation and the scope it applies to.
///
/// # Examples
///
/// ```
/// use folio_core::{DecisionScope, RevisionDecision};
///
/// let decision = RevisionDecision::delete(DecisionScope::Global);
/// assert_eq!(decision.operation().to_string(), "delete");
/// assert_eq!(*decision.scope(), DecisionScope::Global);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RevisionDecision {
    /// Operation to apply
    operation: RevisionOperation,
    /// Reach of the operation
    scope: DecisionScope,
}

impl RevisionDecision {
    /// Create a decision.
    pub fn new(operation: RevisionOperation, scope: DecisionScope) -> Self {
        Self { operation, scope }
    }

    /// Keep at the given scope.
    pub fn keep(scope: DecisionScope) -> Self {
        Self::new(RevisionOperation::Keep, scope)
    }

    /// Delete at the given scope.
    pub fn delete(scope: DecisionScope) -> Self {
        Self::new(RevisionOperation::Delete, scope)
    }

    /// Literal replacement at the given scope.
    pub fn literal(text: impl Into<String>, scope: DecisionScope) -> Self {
        Self::new(
            RevisionOperation::Change(ChangeSpec::Literal { text: text.into() }),
            scope,
        )
    }

    /// Provider rewrite at the given scope.
    pub fn rewrite(instruction: impl Into<String>, scope: DecisionScope) -> Self {
        Self::new(
            RevisionOperation::Change(ChangeSpec::Rewrite {
                instruction: instruction.into(),
            }),
            scope,
        )
    }

    /// Split into parts.
    pub fn into_parts(self) -> (RevisionOperation, DecisionScope) {
        (self.operation, self.scope)
    }
}

/// What a decision source is being asked to decide.
#[derive(Debug, Clone, Copy)]
pub enum DecisionRequest<'a> {
    /// First question of a pass: decide for everything, or narrow the scope
    Run {
        /// All groups in the pass
        groups: &'a [MatchGroup],
    },
    /// Decide for every match of one pattern, or narrow to single matches
    Group {
        /// The group in question
        group: &'a MatchGroup,
    },
    /// Decide for one match
    Match {
        /// The match in question
        found: &'a Match,
        /// Position of the match within its group, 1-based
        position: usize,
        /// Size of the group
        of: usize,
    },
}

/// A provider rewrite awaiting operator review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RewriteProposal {
    /// Pattern that triggered the rewrite
    pattern: String,
    /// Sentence as it stands in the chapter
    original: String,
    /// Proposed replacement
    proposed: String,
    /// 1-based attempt number
    #[getter(copy)]
    attempt: u32,
}

impl RewriteProposal {
    /// Create a proposal.
    pub fn new(
        pattern: impl Into<String>,
        original: impl Into<String>,
        proposed: impl Into<String>,
        attempt: u32,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            original: original.into(),
            proposed: proposed.into(),
            attempt,
        }
    }
}

/// Operator answer to a rewrite proposal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RewriteVerdict {
    /// Use the proposed text
    Accept,
    /// Ask the provider again
    Regenerate,
    /// Abandon the rewrite and keep the sentence
    KeepOriginal,
}
