//! Splitting raw provider output into fragment and summary.

use crate::{RuleChain, RuleState};
use folio_core::Fragment;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// A line holding nothing but a short run of dash-like punctuation or
/// markdown emphasis markers.
static SUMMARY_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-\u{2010}-\u{2015}\u{2212}]{1,10}|[*_]{2,10})[ \t]*\r?$")
        .expect("Valid summary delimiter regex")
});

/// Split `raw` at the first summary delimiter.
///
/// Returns the trimmed text before and after the delimiter; without a
/// delimiter the whole trimmed text is the fragment and the summary is
/// empty. A delimiter with only whitespace before it opens the fragment
/// and does not count.
///
/// # Examples
///
/// ```
/// use folio_narrative::split_summary;
///
/// let (fragment, summary) = split_summary("The cave was dark.\n\n---\n\nSummary: a dark cave.");
/// assert_eq!(fragment, "The cave was dark.");
/// assert_eq!(summary, "Summary: a dark cave.");
///
/// assert_eq!(split_summary("  No summary here. \n"), ("No summary here.", ""));
/// ```
pub fn split_summary(raw: &str) -> (&str, &str) {
    let delimiter = SUMMARY_DELIMITER
        .find_iter(raw)
        .find(|m| !raw[..m.start()].trim().is_empty());
    match delimiter {
        Some(delimiter) => (
            raw[..delimiter.start()].trim(),
            raw[delimiter.end()..].trim(),
        ),
        None => (raw.trim(), ""),
    }
}

/// Turns one raw provider response into a [`Fragment`].
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    rules: RuleChain,
}

impl ResponseParser {
    /// Parser applying `rules` to the fragment half.
    pub fn new(rules: RuleChain) -> Self {
        Self { rules }
    }

    /// The rule chain.
    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }

    /// Split `raw` into fragment and summary and normalize the fragment.
    ///
    /// The summary is returned untouched; `state` carries title dedup
    /// across calls.
    pub fn parse(&self, raw: &str, state: &mut RuleState) -> Fragment {
        let (fragment, summary) = split_summary(raw);
        let normalized = self.rules.apply(fragment, state);
        debug!(
            raw_chars = raw.len(),
            fragment_chars = normalized.len(),
            has_summary = !summary.is_empty(),
            "Parsed response"
        );
        Fragment::new(normalized.trim(), summary)
    }
}
