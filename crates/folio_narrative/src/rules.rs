//! Normalization rule chain applied to every parsed fragment.
//!
//! Rules run in declaration order, each on the output of the previous one.
//! Stateful rules read and update an explicit [`RuleState`] threaded through
//! every invocation; nothing is captured ambiently.

use folio_error::{ConfigError, FolioResult};
use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Markdown chapter heading, optionally preceded by a separator.
///
/// The separator is part of the match so re-applying the rule to its own
/// output reproduces that output.
pub const CHAPTER_TITLE_PATTERN: &str = r"(?:---\s*)?\*\*Chapter\s+[0-9IVXLCivxlc]+\b[^*\n]*\*\*";

/// Runs of three or more newlines.
const BLANK_RUN_PATTERN: &str = r"\n[ \t]*\n(?:[ \t]*\n)+";

/// State carried between rule chain invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleState {
    seen_titles: HashSet<String>,
}

impl RuleState {
    /// Fresh state with nothing seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a title (in any formatting) has already been emitted.
    pub fn has_seen(&self, title: &str) -> bool {
        self.seen_titles.contains(&title_key(title))
    }

    /// Number of distinct titles emitted.
    pub fn titles_seen(&self) -> usize {
        self.seen_titles.len()
    }
}

/// Replacement computed from a match and the carried state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatefulAction {
    /// Keep the first occurrence of a title behind a separator, drop repeats
    DedupeTitle,
}

impl StatefulAction {
    fn apply(self, matched: &str, state: &mut RuleState) -> String {
        match self {
            StatefulAction::DedupeTitle => {
                let title = matched.trim_start_matches(['-', ' ', '\t', '\r', '\n']).trim();
                if state.seen_titles.insert(title_key(title)) {
                    format!("---\n\n{}", title)
                } else {
                    trace!(title, "Dropping repeated chapter title");
                    String::new()
                }
            }
        }
    }
}

/// Comparison key for titles: formatting stripped, case folded.
fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '*' | '#' | '-'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One compiled normalization rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Replace every match with a literal string
    Substitution {
        /// Match pattern
        pattern: Regex,
        /// Literal replacement, `$` is not expanded
        replacement: String,
    },
    /// Replace every match with the result of an action over carried state
    Stateful {
        /// Match pattern
        pattern: Regex,
        /// Action producing the replacement
        action: StatefulAction,
    },
    /// Remove every match
    Deletion {
        /// Match pattern
        pattern: Regex,
    },
}

impl Rule {
    /// Apply the rule to `text`.
    pub fn apply(&self, text: &str, state: &mut RuleState) -> String {
        match self {
            Rule::Substitution {
                pattern,
                replacement,
            } => pattern
                .replace_all(text, NoExpand(replacement.as_str()))
                .into_owned(),
            Rule::Stateful { pattern, action } => pattern
                .replace_all(text, |caps: &Captures| action.apply(&caps[0], state))
                .into_owned(),
            Rule::Deletion { pattern } => pattern.replace_all(text, "").into_owned(),
        }
    }

    fn pattern(&self) -> &Regex {
        match self {
            Rule::Substitution { pattern, .. }
            | Rule::Stateful { pattern, .. }
            | Rule::Deletion { pattern } => pattern,
        }
    }
}

/// Rule as written in configuration.
///
/// ```toml
/// [[rules]]
/// kind = "stateful"
/// pattern = '(?:---\s*)?\*\*Chapter\s+[0-9IVXLC]+\b[^*\n]*\*\*'
/// action = "dedupe_title"
///
/// [[rules]]
/// kind = "substitution"
/// pattern = '\s+—\s+'
/// replacement = "—"
///
/// [[rules]]
/// kind = "deletion"
/// pattern = '(?m)^\s*\[Fragment \d+\]\s*$'
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    /// See [`Rule::Substitution`]
    Substitution {
        /// Regular expression
        pattern: String,
        /// Literal replacement
        replacement: String,
    },
    /// See [`Rule::Stateful`]
    Stateful {
        /// Regular expression
        pattern: String,
        /// Named action
        action: StatefulAction,
    },
    /// See [`Rule::Deletion`]
    Deletion {
        /// Regular expression
        pattern: String,
    },
}

impl RuleSpec {
    /// Compile the rule.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the pattern if it does not compile.
    pub fn compile(&self) -> FolioResult<Rule> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                ConfigError::new(format!("Invalid rule pattern '{}': {}", pattern, e))
            })
        };
        Ok(match self {
            RuleSpec::Substitution {
                pattern,
                replacement,
            } => Rule::Substitution {
                pattern: compile(pattern)?,
                replacement: replacement.clone(),
            },
            RuleSpec::Stateful { pattern, action } => Rule::Stateful {
                pattern: compile(pattern)?,
                action: *action,
            },
            RuleSpec::Deletion { pattern } => Rule::Deletion {
                pattern: compile(pattern)?,
            },
        })
    }
}

/// Ordered sequence of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// A chain with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a chain from configuration.
    ///
    /// # Errors
    ///
    /// Fails on the first pattern that does not compile.
    pub fn from_specs(specs: &[RuleSpec]) -> FolioResult<Self> {
        let rules = specs
            .iter()
            .map(RuleSpec::compile)
            .collect::<FolioResult<Vec<_>>>()?;
        debug!(rules = rules.len(), "Compiled rule chain");
        Ok(Self { rules })
    }

    /// The chain used when none is configured: chapter title dedup, then
    /// collapsing runs of blank lines.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Rule::Stateful {
                    pattern: Regex::new(CHAPTER_TITLE_PATTERN).expect("Valid chapter title regex"),
                    action: StatefulAction::DedupeTitle,
                },
                Rule::Substitution {
                    pattern: Regex::new(BLANK_RUN_PATTERN).expect("Valid blank run regex"),
                    replacement: "\n\n".to_string(),
                },
            ],
        }
    }

    /// Append a rule.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the chain has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order.
    pub fn apply(&self, text: &str, state: &mut RuleState) -> String {
        self.rules.iter().fold(text.to_string(), |current, rule| {
            let next = rule.apply(&current, state);
            if next != current {
                trace!(pattern = %rule.pattern(), "Rule changed text");
            }
            next
        })
    }
}
