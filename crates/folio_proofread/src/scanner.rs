//! Multi-provider pattern scanning.

use crate::{IndexedChapter, PatternKind, PatternSpec};
use folio_core::RawMatch;
use folio_error::{FolioError, FolioResult, GenerationError, GenerationErrorKind};
use folio_interface::ProviderAdapter;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Appended to a scan prompt after a reply that could not be parsed.
pub const STRICT_JSON_REMINDER: &str = "IMPORTANT: Your previous answer could not be parsed. \
     Respond with only a valid JSON array, with no commentary and no markdown fences. \
     Respond with [] if there are no occurrences.";

const REPLY_FORMAT: &str = "Return every occurrence as a JSON array of objects with the keys \
     \"match\" (the exact words in the text), \"sentence\" (the full sentence, copied exactly) \
     and \"sentence_index\" (the number in brackets before the sentence). \
     Return [] if there are no occurrences.";

/// Build the analysis prompt for one pattern over an indexed chapter.
pub fn scan_prompt(pattern: &PatternSpec, chapter: &IndexedChapter) -> String {
    let task = match pattern.kind() {
        PatternKind::BadPattern => format!(
            "Find every occurrence of the pattern \"{}\" in the numbered sentences below. \
             The pattern covers: {}",
            pattern.id(),
            pattern.description()
        ),
        PatternKind::DuplicateContent => format!(
            "Find every sentence below that repeats content already stated in an earlier \
             sentence ({}). Report only the later, repeating sentence.",
            pattern.description()
        ),
    };
    format!("{}\n\n{}\n\n{}", task, REPLY_FORMAT, chapter.render())
}

/// What one provider reported for one pattern.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct ProviderFindings {
    /// Pattern identifier
    pattern: String,
    /// Reporting provider
    provider: String,
    /// Items as returned, possibly including strays
    items: Vec<RawMatch>,
}

impl ProviderFindings {
    /// Wrap one provider's reply.
    pub fn new(
        pattern: impl Into<String>,
        provider: impl Into<String>,
        items: Vec<RawMatch>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            provider: provider.into(),
            items,
        }
    }
}

/// Sends the same analysis prompt to every provider, one call at a time.
///
/// A provider whose reply stays unparseable after one stricter retry
/// contributes nothing for that pattern. Any other failure has already
/// exhausted the adapter's retries and aborts the scan.
pub struct PatternScanner<'a> {
    providers: &'a [Arc<dyn ProviderAdapter>],
}

impl<'a> PatternScanner<'a> {
    /// Create a scanner over `providers`, asked in order.
    pub fn new(providers: &'a [Arc<dyn ProviderAdapter>]) -> Self {
        Self { providers }
    }

    /// Scan `chapter` for every pattern.
    ///
    /// # Errors
    ///
    /// Returns `NoProviders` when no provider is configured, or a fatal
    /// error naming the pattern and provider for unrecoverable failures.
    #[instrument(skip_all, fields(patterns = patterns.len(), sentences = chapter.len()))]
    pub async fn scan(
        &self,
        chapter: &IndexedChapter,
        patterns: &[PatternSpec],
    ) -> FolioResult<Vec<ProviderFindings>> {
        if self.providers.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::NoProviders {
                stage: "pattern scan".to_string(),
            })
            .into());
        }

        let mut findings = Vec::with_capacity(patterns.len() * self.providers.len());
        for pattern in patterns {
            let prompt = scan_prompt(pattern, chapter);
            for provider in self.providers {
                let items = self.scan_one(provider.as_ref(), pattern.id(), &prompt).await?;
                findings.push(ProviderFindings::new(
                    pattern.id(),
                    provider.provider_name(),
                    items,
                ));
            }
        }

        info!(
            reports = findings.len(),
            items = findings.iter().map(|f| f.items.len()).sum::<usize>(),
            "Scan complete"
        );
        Ok(findings)
    }

    async fn scan_one(
        &self,
        provider: &dyn ProviderAdapter,
        pattern: &str,
        prompt: &str,
    ) -> FolioResult<Vec<RawMatch>> {
        let name = provider.provider_name();
        match provider.scan_patterns(prompt).await {
            Ok(items) => {
                debug!(provider = name, pattern, items = items.len(), "Scan reply");
                return Ok(items);
            }
            Err(e) if is_malformed(&e) => {
                warn!(provider = name, pattern, error = %e, "Unparseable scan reply, retrying");
            }
            Err(e) => return Err(fatal(pattern, name, e)),
        }

        let strict = format!("{}\n\n{}", prompt, STRICT_JSON_REMINDER);
        match provider.scan_patterns(&strict).await {
            Ok(items) => Ok(items),
            Err(e) if is_malformed(&e) => {
                warn!(
                    provider = name,
                    pattern,
                    error = %e,
                    "Scan reply still unparseable, provider contributes nothing"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(fatal(pattern, name, e)),
        }
    }
}

fn is_malformed(err: &FolioError) -> bool {
    err.as_provider().is_some_and(|p| p.kind.is_malformed())
}

fn fatal(pattern: &str, provider: &str, err: FolioError) -> FolioError {
    GenerationError::fatal(format!("scan \"{}\"", pattern), provider, err.to_string()).into()
}
