//! Token counting for provider adapters.

use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;
use tracing::warn;

static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn cl100k() -> Option<&'static CoreBPE> {
    CL100K
        .get_or_init(|| {
            tiktoken_rs::cl100k_base()
                .map_err(|e| warn!(error = %e, "Failed to load tokenizer, estimating tokens"))
                .ok()
        })
        .as_ref()
}

/// Rough estimate of four bytes per token, never zero.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4).max(1) as u64
}

/// Count tokens with the cl100k_base encoding.
///
/// Used for every provider as an approximation; falls back to
/// [`estimate_tokens`] if the tokenizer cannot be loaded.
pub fn count_tokens(text: &str) -> u64 {
    match cl100k() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len() as u64,
        None => estimate_tokens(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        let count = count_tokens("Hello, world!");
        assert!(count > 0);
        assert!(count < 10);
    }

    #[test]
    fn test_estimate_never_zero() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }
}
