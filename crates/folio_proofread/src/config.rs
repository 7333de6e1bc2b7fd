//! Proofreading settings, the `[proofread]` table.

use crate::Segmentation;
use folio_error::{FolioResult, GenerationError, GenerationErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_max_rewrite_attempts() -> u32 {
    3
}

fn default_max_invalid_decisions() -> u32 {
    5
}

/// What a scan looks for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternKind {
    /// A phrase or habit to flag wherever it occurs
    #[default]
    BadPattern,
    /// Sentences repeating content stated earlier in the chapter
    DuplicateContent,
}

/// Automated remediation for a pattern, used by the policy decision source.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternAction {
    /// Leave matches alone
    Keep,
    /// Remove matched sentences
    Delete,
    /// Have a provider rewrite matched sentences
    Rewrite,
}

/// One scan target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PatternSpec {
    /// Identifier reported with every match, e.g. "heart raced"
    id: String,
    /// What providers should flag
    description: String,
    /// Scan flavour
    #[serde(default)]
    #[getter(copy)]
    kind: PatternKind,
    /// Policy action, if automated
    #[serde(default)]
    #[getter(copy)]
    action: Option<PatternAction>,
}

impl PatternSpec {
    /// A bad-pattern target without automated action.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind: PatternKind::BadPattern,
            action: None,
        }
    }

    /// Set the scan flavour.
    pub fn with_kind(mut self, kind: PatternKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the policy action.
    pub fn with_action(mut self, action: PatternAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Settings for a proofreading pass.
///
/// # Example
///
/// ```toml
/// [proofread]
/// providers = ["openai", "anthropic"]
/// segmentation = "abbreviation_aware"
/// max_rewrite_attempts = 3
///
/// [[proofread.patterns]]
/// id = "heart raced"
/// description = "Clichéd descriptions of a racing or pounding heart"
/// action = "rewrite"
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), default)]
pub struct ProofreadConfig {
    /// Providers asked to scan, in order
    #[serde(default)]
    providers: Vec<String>,
    /// Sentence splitting for the whole pass
    #[serde(default)]
    #[getter(copy)]
    segmentation: Segmentation,
    /// Proposals offered per rewrite before keeping the original
    #[serde(default = "default_max_rewrite_attempts")]
    #[getter(copy)]
    max_rewrite_attempts: u32,
    /// Consecutive invalid answers tolerated per question
    #[serde(default = "default_max_invalid_decisions")]
    #[getter(copy)]
    max_invalid_decisions: u32,
    /// Scan targets
    #[serde(default)]
    patterns: Vec<PatternSpec>,
}

impl Default for ProofreadConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            segmentation: Segmentation::default(),
            max_rewrite_attempts: default_max_rewrite_attempts(),
            max_invalid_decisions: default_max_invalid_decisions(),
            patterns: Vec::new(),
        }
    }
}

impl ProofreadConfig {
    /// Creates a new builder.
    pub fn builder() -> ProofreadConfigBuilder {
        ProofreadConfigBuilder::default()
    }

    /// Look up a pattern by identifier.
    pub fn pattern(&self, id: &str) -> Option<&PatternSpec> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Reject settings that cannot drive a pass.
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error for blank or repeated pattern
    /// identifiers and zero attempt limits.
    pub fn validate(&self) -> FolioResult<()> {
        let invalid =
            |msg: String| GenerationError::new(GenerationErrorKind::InvalidConfiguration(msg));

        if self.max_rewrite_attempts == 0 {
            return Err(invalid("max_rewrite_attempts must be at least 1".to_string()).into());
        }
        if self.max_invalid_decisions == 0 {
            return Err(invalid("max_invalid_decisions must be at least 1".to_string()).into());
        }
        let mut seen = HashSet::new();
        for pattern in &self.patterns {
            if pattern.id.trim().is_empty() {
                return Err(invalid("pattern id must not be blank".to_string()).into());
            }
            if !seen.insert(pattern.id.as_str()) {
                return Err(invalid(format!("pattern '{}' is defined twice", pattern.id)).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let config: ProofreadConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_rewrite_attempts(), 3);
        assert_eq!(config.segmentation(), Segmentation::AbbreviationAware);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_patterns_from_toml() {
        let config: ProofreadConfig = toml::from_str(
            r#"
            providers = ["a", "b"]
            segmentation = "plain"

            [[patterns]]
            id = "heart raced"
            description = "Racing hearts"
            action = "delete"

            [[patterns]]
            id = "repeats"
            description = "Restated facts"
            kind = "duplicate_content"
            "#,
        )
        .unwrap();
        assert_eq!(config.providers(), &["a", "b"]);
        assert_eq!(config.segmentation(), Segmentation::Plain);
        let heart = config.pattern("heart raced").unwrap();
        assert_eq!(heart.action(), Some(PatternAction::Delete));
        assert_eq!(heart.kind(), PatternKind::BadPattern);
        assert_eq!(
            config.pattern("repeats").unwrap().kind(),
            PatternKind::DuplicateContent
        );
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let config = ProofreadConfig::builder()
            .patterns(vec![PatternSpec::new("x", "a"), PatternSpec::new("x", "b")])
            .build()
            .unwrap();
        assert!(config.validate().is_err());
    }
}
