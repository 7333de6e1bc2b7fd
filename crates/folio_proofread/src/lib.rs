//! Proofreading pass over finished chapters.
//!
//! A pass segments a chapter into indexed sentences, asks every configured
//! provider to report occurrences of each target pattern
//! ([`PatternScanner`]), reconciles their reports into one deduplicated set
//! per pattern ([`MatchMerger`]) and lets a [`DecisionSource`] decide what
//! happens to each finding ([`RevisionEngine`]).
//!
//! [`DecisionSource`]: folio_interface::DecisionSource

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod merger;
mod pass;
mod revision;
mod scanner;
mod segment;
mod sources;

pub use config::{
    PatternAction, PatternKind, PatternSpec, ProofreadConfig, ProofreadConfigBuilder,
};
pub use merger::{MatchMerger, normalize};
pub use pass::{ProofreadPass, ProofreadReport};
pub use revision::{RevisionEngine, RevisionOutcome};
pub use scanner::{PatternScanner, ProviderFindings, STRICT_JSON_REMINDER, scan_prompt};
pub use segment::{IndexedChapter, Segmentation, segment};
pub use sources::{PolicyDecisionSource, ScriptedDecisionSource};
