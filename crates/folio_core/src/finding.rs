//! Pattern scan findings.

use serde::{Deserialize, Deserializer, Serialize};

/// One item of a provider's structured scan reply.
///
/// Providers are asked for `{match, sentence, sentence_index}` objects but
/// sometimes emit bare strings or partial objects; those land in `Stray`.
///
/// # Examples
///
/// ```
/// use folio_core::RawMatch;
///
/// let items: Vec<RawMatch> = serde_json::from_str(
///     r#"[{"match": "heart raced", "sentence": "Her heart raced.", "sentence_index": "4"}, "oops"]"#,
/// ).unwrap();
/// assert_eq!(items[0].as_finding().unwrap().sentence_index(), 4);
/// assert!(items[1].as_finding().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMatch {
    /// Well-formed finding
    Finding(RawFinding),
    /// Anything else the provider returned
    Stray(serde_json::Value),
}

impl RawMatch {
    /// The finding, if the item was well formed.
    pub fn as_finding(&self) -> Option<&RawFinding> {
        match self {
            RawMatch::Finding(finding) => Some(finding),
            RawMatch::Stray(_) => None,
        }
    }
}

/// A well-formed finding before provider attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RawFinding {
    /// Substring the provider flagged
    #[serde(rename = "match")]
    matched: String,
    /// Full sentence containing the substring
    sentence: String,
    /// 1-based sentence index, accepted as a number or numeric string
    #[serde(deserialize_with = "lenient_index")]
    #[getter(copy)]
    sentence_index: usize,
}

impl RawFinding {
    /// Create a finding.
    pub fn new(
        matched: impl Into<String>,
        sentence: impl Into<String>,
        sentence_index: usize,
    ) -> Self {
        Self {
            matched: matched.into(),
            sentence: sentence.into(),
            sentence_index,
        }
    }
}

fn lenient_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(usize),
        Text(String),
    }

    match Index::deserialize(deserializer)? {
        Index::Number(n) => Ok(n),
        Index::Text(s) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

/// A finding attributed to a pattern and provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Match {
    /// Pattern identifier
    pattern: String,
    /// Substring the provider flagged
    matched: String,
    /// Sentence containing the substring
    sentence: String,
    /// 1-based sentence index within the pass
    #[getter(copy)]
    sentence_index: usize,
    /// Provider that reported the finding
    provider: String,
}

impl Match {
    /// Attribute a raw finding.
    pub fn from_raw(
        pattern: impl Into<String>,
        provider: impl Into<String>,
        raw: &RawFinding,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            matched: raw.matched.clone(),
            sentence: raw.sentence.clone(),
            sentence_index: raw.sentence_index,
            provider: provider.into(),
        }
    }
}

/// All findings for one pattern, ordered by sentence index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct MatchGroup {
    /// Pattern identifier
    pattern: String,
    /// Findings sorted by ascending sentence index
    matches: Vec<Match>,
}

impl MatchGroup {
    /// Create a group. Callers are responsible for ordering.
    pub fn new(pattern: impl Into<String>, matches: Vec<Match>) -> Self {
        Self {
            pattern: pattern.into(),
            matches,
        }
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the group has no findings.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_stray() {
        let item: RawMatch = serde_json::from_str(r#"{"match": "x", "sentence_index": 2}"#).unwrap();
        assert!(item.as_finding().is_none());
    }

    #[test]
    fn test_non_numeric_index_is_stray() {
        let item: RawMatch =
            serde_json::from_str(r#"{"match": "x", "sentence": "X.", "sentence_index": "two"}"#)
                .unwrap();
        assert!(item.as_finding().is_none());
    }

    #[test]
    fn test_bracketed_index_is_accepted() {
        let item: RawMatch =
            serde_json::from_str(r#"{"match": "x", "sentence": "X.", "sentence_index": "[7]"}"#)
                .unwrap();
        assert_eq!(item.as_finding().unwrap().sentence_index(), 7);
    }
}
