//! Consensus merge of provider findings.

use crate::ProviderFindings;
use folio_core::{Match, MatchGroup};
use tracing::{debug, instrument};

/// Collapse whitespace runs and lowercase, for comparing reported text.
///
/// ```
/// use folio_proofread::normalize;
///
/// assert_eq!(normalize("  Her  heart\nRaced. "), "her heart raced.");
/// ```
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reconciles reports from several providers into one group per pattern.
///
/// Two findings for the same pattern are the same when they sit at the same
/// sentence index and agree on either the matched words or the sentence
/// text. A provider reporting twice at one index is also collapsed. The
/// first report wins, so attribution follows provider order.
#[derive(Debug, Clone, Copy)]
pub struct MatchMerger {
    sentence_count: usize,
}

impl MatchMerger {
    /// Merge against a pass with `sentence_count` indexed sentences.
    pub fn new(sentence_count: usize) -> Self {
        Self { sentence_count }
    }

    /// Merge raw reports.
    ///
    /// Stray items and findings whose index falls outside the pass are
    /// dropped. Groups appear in the order patterns were first reported and
    /// are sorted by ascending sentence index; patterns with no surviving
    /// findings produce no group.
    #[instrument(skip_all, fields(reports = reports.len()))]
    pub fn merge(&self, reports: &[ProviderFindings]) -> Vec<MatchGroup> {
        let mut collected: Vec<(String, Vec<Match>)> = Vec::new();
        let mut dropped = 0usize;

        for report in reports {
            let slot = match collected.iter().position(|(p, _)| p == report.pattern()) {
                Some(slot) => slot,
                None => {
                    collected.push((report.pattern().clone(), Vec::new()));
                    collected.len() - 1
                }
            };

            for item in report.items() {
                let Some(finding) = item.as_finding() else {
                    dropped += 1;
                    continue;
                };
                if !(1..=self.sentence_count).contains(&finding.sentence_index()) {
                    debug!(
                        provider = %report.provider(),
                        index = finding.sentence_index(),
                        "Dropping finding outside the pass"
                    );
                    dropped += 1;
                    continue;
                }
                collected[slot]
                    .1
                    .push(Match::from_raw(report.pattern(), report.provider(), finding));
            }
        }

        let groups = self.finish(collected);
        debug!(
            groups = groups.len(),
            matches = groups.iter().map(MatchGroup::len).sum::<usize>(),
            dropped,
            "Merged findings"
        );
        groups
    }

    /// Re-merge already merged groups. Merging is idempotent, so merged
    /// input comes back unchanged.
    pub fn merge_groups(&self, groups: Vec<MatchGroup>) -> Vec<MatchGroup> {
        let collected = groups
            .into_iter()
            .map(|g| (g.pattern().clone(), g.matches().clone()))
            .collect();
        self.finish(collected)
    }

    fn finish(&self, collected: Vec<(String, Vec<Match>)>) -> Vec<MatchGroup> {
        collected
            .into_iter()
            .map(|(pattern, matches)| MatchGroup::new(pattern, dedupe(matches)))
            .filter(|group| !group.is_empty())
            .collect()
    }
}

fn same_finding(a: &Match, b: &Match) -> bool {
    a.sentence_index() == b.sentence_index()
        && (normalize(a.matched()) == normalize(b.matched())
            || normalize(a.sentence()) == normalize(b.sentence())
            || a.provider() == b.provider())
}

fn dedupe(matches: Vec<Match>) -> Vec<Match> {
    let mut kept: Vec<Match> = Vec::with_capacity(matches.len());
    for candidate in matches {
        if !kept.iter().any(|k| same_finding(k, &candidate)) {
            kept.push(candidate);
        }
    }
    // Stable, so equal indices keep report order
    kept.sort_by_key(Match::sentence_index);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{RawFinding, RawMatch};

    fn finding(matched: &str, sentence: &str, index: usize) -> RawMatch {
        RawMatch::Finding(RawFinding::new(matched, sentence, index))
    }

    #[test]
    fn test_substring_disagreement_same_sentence() {
        let reports = vec![
            ProviderFindings::new("p", "a", vec![finding("heart raced", "Her heart raced.", 4)]),
            ProviderFindings::new("p", "b", vec![finding("raced", "Her heart raced.", 4)]),
        ];
        let groups = MatchMerger::new(10).merge(&reports);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[0].matches()[0].provider(), "a");
    }

    #[test]
    fn test_same_provider_twice_at_one_index() {
        let reports = vec![ProviderFindings::new("p", "a", vec![
            finding("x", "Sentence one.", 2),
            finding("y", "Garbled copy.", 2),
        ])];
        assert_eq!(MatchMerger::new(5).merge(&reports)[0].len(), 1);
    }

    #[test]
    fn test_out_of_range_and_strays_dropped() {
        let reports = vec![ProviderFindings::new("p", "a", vec![
            finding("x", "X.", 0),
            finding("x", "X.", 6),
            RawMatch::Stray(serde_json::json!("x")),
            finding("x", "X.", 5),
        ])];
        let groups = MatchMerger::new(5).merge(&reports);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matches()[0].sentence_index(), 5);
    }

    #[test]
    fn test_empty_patterns_produce_no_group() {
        let reports = vec![
            ProviderFindings::new("quiet", "a", vec![]),
            ProviderFindings::new("loud", "a", vec![finding("x", "X.", 1)]),
        ];
        let groups = MatchMerger::new(3).merge(&reports);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pattern(), "loud");
    }
}
