//! Proofreading command and the pass shared with `generate --proofread`.

use super::{DecisionMode, ProofreadArgs};
use folio::{
    Book, BookBuilder, Chapter, ConfigError, ConsoleDecisionSource, DecisionSource, FolioConfig,
    FolioResult, IoError, PolicyDecisionSource, ProofreadPass, ProofreadReport, write_text,
};
use tracing::{info, warn};

/// Proofread every chapter of `book` in place.
///
/// Scans with `providers` when given, otherwise with `proofread.providers`.
/// Rewrites go to the generation provider; if it cannot be built the pass
/// still runs and only a rewrite decision fails.
pub async fn proofread_book(
    config: &FolioConfig,
    providers: Option<&[String]>,
    book: &mut Book,
    mode: DecisionMode,
) -> FolioResult<Vec<ProofreadReport>> {
    let names = providers.unwrap_or(config.proofread.providers().as_slice());
    let scanners = config.build_providers(names)?;

    let rewriter = match config.build_provider(config.generation.provider()) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!(error = %e, "No rewrite provider available");
            None
        }
    };

    let mut source: Box<dyn DecisionSource> = match mode {
        DecisionMode::Interactive => Box::new(ConsoleDecisionSource::stdio()),
        DecisionMode::Policy => Box::new(PolicyDecisionSource::from_config(&config.proofread)),
    };

    let mut pass = ProofreadPass::new(&scanners, &config.proofread);
    if let Some(rewriter) = rewriter.as_deref() {
        pass = pass.with_rewriter(rewriter);
    }
    let reports = pass.run_book(book, source.as_mut()).await?;

    for report in &reports {
        println!(
            "Chapter {}: {} findings, {} revised, {} kept, {} skipped",
            report.chapter(),
            report.groups().iter().map(|g| g.len()).sum::<usize>(),
            report.outcome().applied(),
            report.outcome().kept(),
            report.outcome().skipped(),
        );
    }
    Ok(reports)
}

/// Proofread a text file as one chapter and write the result.
pub async fn run_proofread(config: FolioConfig, args: ProofreadArgs) -> FolioResult<()> {
    config.validate()?;
    let text = tokio::fs::read_to_string(&args.input).await.map_err(|e| {
        IoError::new(format!("Failed to read {}: {}", args.input.display(), e))
    })?;

    let mut book = BookBuilder::default()
        .outline("")
        .chapters(vec![Chapter::from_text(1, text)])
        .build()
        .map_err(|e| ConfigError::new(e.to_string()))?;

    let reports = proofread_book(&config, args.providers.as_deref(), &mut book, args.decisions)
        .await?;

    let output = args.output.as_ref().unwrap_or(&args.input);
    let changed = reports.iter().any(|r| r.outcome().applied() > 0);
    if changed || args.output.is_some() {
        write_text(output, &book.to_markdown()).await?;
        info!(path = %output.display(), "Revised text written");
    } else {
        info!("No changes; input left untouched");
    }
    Ok(())
}
