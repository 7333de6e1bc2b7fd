//! One proofreading pass: segment, scan, merge, revise.

use crate::{
    IndexedChapter, MatchMerger, PatternScanner, ProofreadConfig, RevisionEngine, RevisionOutcome,
};
use folio_core::{Book, MatchGroup};
use folio_error::FolioResult;
use folio_interface::{DecisionSource, ProviderAdapter};
use std::sync::Arc;
use tracing::{info, instrument};

/// Findings and revision result for one chapter.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ProofreadReport {
    /// 1-based chapter number
    #[getter(copy)]
    chapter: usize,
    /// Merged findings the decisions were made on
    groups: Vec<MatchGroup>,
    /// What the revision changed
    outcome: RevisionOutcome,
}

/// Runs the full proofreading pipeline over chapters.
pub struct ProofreadPass<'a> {
    providers: &'a [Arc<dyn ProviderAdapter>],
    config: &'a ProofreadConfig,
    rewriter: Option<&'a dyn ProviderAdapter>,
}

impl<'a> ProofreadPass<'a> {
    /// Scan with `providers` under `config`.
    pub fn new(providers: &'a [Arc<dyn ProviderAdapter>], config: &'a ProofreadConfig) -> Self {
        Self {
            providers,
            config,
            rewriter: None,
        }
    }

    /// Use `provider` for rewrite decisions.
    pub fn with_rewriter(mut self, provider: &'a dyn ProviderAdapter) -> Self {
        self.rewriter = Some(provider);
        self
    }

    /// Proofread one chapter's text.
    ///
    /// Sentence indices are fixed once, before scanning, and every later
    /// step refers to them.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when no providers are configured, on
    /// unrecoverable provider failures and on decision source failures.
    #[instrument(skip(self, text, source), fields(providers = self.providers.len()))]
    pub async fn run(
        &self,
        chapter: usize,
        text: &str,
        source: &mut dyn DecisionSource,
    ) -> FolioResult<ProofreadReport> {
        self.config.validate()?;
        let indexed = IndexedChapter::new(text, self.config.segmentation());

        let reports = PatternScanner::new(self.providers)
            .scan(&indexed, self.config.patterns())
            .await?;
        let groups = MatchMerger::new(indexed.len()).merge(&reports);

        let mut engine = RevisionEngine::new(self.config);
        if let Some(rewriter) = self.rewriter {
            engine = engine.with_rewriter(rewriter);
        }
        let outcome = engine.revise(&indexed, &groups, source).await?;

        info!(
            chapter,
            findings = groups.iter().map(MatchGroup::len).sum::<usize>(),
            applied = outcome.applied(),
            "Chapter proofread"
        );
        Ok(ProofreadReport {
            chapter,
            groups,
            outcome,
        })
    }

    /// Proofread every chapter of `book`, replacing revised chapters in place.
    ///
    /// # Errors
    ///
    /// Stops at the first chapter that fails; earlier chapters stay revised.
    pub async fn run_book(
        &self,
        book: &mut Book,
        source: &mut dyn DecisionSource,
    ) -> FolioResult<Vec<ProofreadReport>> {
        let mut reports = Vec::with_capacity(book.chapters().len());
        for chapter in book.chapters_mut() {
            let report = self.run(chapter.number(), &chapter.text(), source).await?;
            if report.outcome.applied() > 0 {
                chapter.replace_text(report.outcome.text());
            }
            reports.push(report);
        }
        Ok(reports)
    }
}
