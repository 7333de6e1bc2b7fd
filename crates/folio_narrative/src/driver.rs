//! Book-level driver.

use crate::{FragmentOrchestrator, GenerationConfig, ResponseParser, RuleState};
use folio_core::{Book, RunMetrics};
use folio_error::FolioResult;
use folio_interface::ProviderAdapter;
use tracing::{info, instrument};

/// Everything a run carries from chapter to chapter.
///
/// Passed into each stage and handed back out, so there is no process-wide
/// mutable state.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The book being written
    pub book: Book,
    /// Title dedup state of the rule chain
    pub rule_state: RuleState,
    /// Run tallies
    pub metrics: RunMetrics,
}

impl RunContext {
    /// Start a run for `book`.
    pub fn new(book: Book) -> Self {
        Self {
            book,
            rule_state: RuleState::new(),
            metrics: RunMetrics::new(),
        }
    }
}

/// Generate `config.chapters()` chapters in order and append them to the book.
///
/// Chapters are numbered after any the book already holds.
///
/// # Errors
///
/// Returns the configuration error if the settings are invalid, or the
/// first fatal generation error, which names the stage and provider.
#[instrument(
    skip_all,
    fields(provider = %provider.provider_name(), chapters = config.chapters())
)]
pub async fn write_book(
    provider: &dyn ProviderAdapter,
    mut run: RunContext,
    config: &GenerationConfig,
    parser: &ResponseParser,
) -> FolioResult<RunContext> {
    config.validate()?;
    let orchestrator = FragmentOrchestrator::new(provider, parser, config);
    let reference = run.book.reference_material();

    for _ in 0..config.chapters() {
        let number = run.book.chapters().len() + 1;
        let chapter = orchestrator
            .write_chapter(number, &reference, &mut run.rule_state, &mut run.metrics)
            .await?;
        run.book.push_chapter(chapter);
    }

    info!(
        chapters = run.book.chapters().len(),
        words = run.metrics.total_words(),
        "Book generation complete"
    );
    Ok(run)
}
