//! Extracting structured findings from provider replies.
//!
//! Scan replies often wrap the requested JSON array in markdown code fences
//! or surround it with commentary. Extraction tries code fences first, then
//! the first balanced array or object.

use folio_core::RawMatch;
use folio_error::{FolioResult, ProviderError};
use serde_json::Value;
use tracing::debug;

/// Keys under which providers sometimes nest the findings array.
const WRAPPER_KEYS: &[&str] = &["matches", "findings", "results", "occurrences"];

/// Extract JSON text from a reply that may contain markdown or extra text.
///
/// # Examples
///
/// ```
/// use folio_models::extract_json;
///
/// let reply = "Here you go:\n```json\n[{\"match\": \"x\"}]\n```\n";
/// assert_eq!(extract_json(reply).unwrap(), "[{\"match\": \"x\"}]");
/// assert!(extract_json("no structure here").is_none());
/// ```
pub fn extract_json(reply: &str) -> Option<String> {
    if let Some(json) = extract_from_code_block(reply, "json") {
        return Some(json);
    }

    let bracket_pos = reply.find('[');
    let brace_pos = reply.find('{');

    match (bracket_pos, brace_pos) {
        (Some(b), Some(c)) if b < c => {
            extract_balanced(reply, '[', ']').or_else(|| extract_balanced(reply, '{', '}'))
        }
        (Some(_), None) => extract_balanced(reply, '[', ']'),
        _ => extract_balanced(reply, '{', '}').or_else(|| extract_balanced(reply, '[', ']')),
    }
}

/// Parse a scan reply into raw findings.
///
/// Accepts a bare array, an object wrapping an array under a common key, or
/// a single finding object. An empty array is a valid "nothing found".
///
/// # Errors
///
/// Returns a malformed provider error if the reply is empty or holds no
/// parseable JSON of an accepted shape.
pub fn parse_findings(provider: &str, reply: &str) -> FolioResult<Vec<RawMatch>> {
    if reply.trim().is_empty() {
        return Err(ProviderError::malformed(provider, "empty scan reply").into());
    }

    let json = extract_json(reply).ok_or_else(|| {
        ProviderError::malformed(
            provider,
            format!("No JSON found in scan reply (length: {})", reply.len()),
        )
    })?;

    let value: Value = serde_json::from_str(&json).map_err(|e| {
        ProviderError::malformed(provider, format!("Invalid JSON in scan reply: {}", e))
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match WRAPPER_KEYS.iter().find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }) {
                Some(items) => items,
                None => vec![Value::Object(map)],
            }
        }
        other => {
            return Err(ProviderError::malformed(
                provider,
                format!("Scan reply is not a list: {}", other),
            )
            .into());
        }
    };

    let findings: Vec<RawMatch> = items.into_iter().map(into_raw_match).collect();
    debug!(
        provider,
        items = findings.len(),
        well_formed = findings.iter().filter(|f| f.as_finding().is_some()).count(),
        "Parsed scan reply"
    );
    Ok(findings)
}

fn into_raw_match(item: Value) -> RawMatch {
    serde_json::from_value(item.clone()).unwrap_or(RawMatch::Stray(item))
}

/// Extract content from markdown code blocks.
fn extract_from_code_block(reply: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = reply.find(&pattern) {
        let content_start = start + pattern.len();
        return Some(match reply[content_start..].find("```") {
            Some(end) => reply[content_start..content_start + end].trim().to_string(),
            // Truncated reply without a closing fence
            None => reply[content_start..].trim().to_string(),
        });
    }

    let start = reply.find("```")?;
    let content_start = start + 3;
    let skip_to = reply[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    let content = match reply[skip_to..].find("```") {
        Some(end) => &reply[skip_to..skip_to + end],
        None => &reply[skip_to..],
    };
    let content = content.trim();
    (content.starts_with('[') || content.starts_with('{')).then(|| content.to_string())
}

/// Extract content between balanced delimiters, skipping string literals.
fn extract_balanced(reply: &str, open: char, close: char) -> Option<String> {
    let start = reply.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in reply[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(reply[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
