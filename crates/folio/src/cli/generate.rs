//! Book generation command.

use super::{DecisionMode, GenerateArgs, proofread_book};
use folio::{
    Book, BookBuilder, ConfigError, FolioConfig, FolioResult, GenerationConfig, ResponseParser,
    RunContext, load_source, write_book, write_markdown, write_summary,
};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Layer command-line overrides over the `[generation]` table.
fn apply_overrides(base: &GenerationConfig, args: &GenerateArgs) -> FolioResult<GenerationConfig> {
    GenerationConfig::builder()
        .provider(args.provider.clone().unwrap_or_else(|| base.provider().clone()))
        .genre(args.genre.clone().unwrap_or_else(|| base.genre().clone()))
        .chapters(args.chapters.unwrap_or(base.chapters()))
        .fragments(args.fragments.unwrap_or(base.fragments()))
        .use_memory(base.use_memory() && !args.no_memory)
        .prompts(base.prompts().clone())
        .build()
        .map_err(|e| ConfigError::new(format!("Invalid generation settings: {}", e)).into())
}

/// Write the book, then proofread it and overwrite the file with the result.
///
/// A failed proofread leaves the unrevised book on disk.
async fn save_and_proofread(
    config: &FolioConfig,
    book: &mut Book,
    output: &Path,
    proofread: Option<DecisionMode>,
) -> FolioResult<()> {
    write_markdown(output, book).await?;

    let Some(mode) = proofread else {
        return Ok(());
    };
    if let Err(e) = proofread_book(config, None, book, mode).await {
        warn!(error = %e, path = %output.display(), "Proofreading failed; unrevised book kept");
        return Err(e);
    }
    write_markdown(output, book).await?;
    info!(path = %output.display(), "Proofread book written");
    Ok(())
}

/// Generate a book, optionally proofread it, and write it out.
#[instrument(skip_all, fields(output = %args.output.display()))]
pub async fn run_generate(mut config: FolioConfig, args: GenerateArgs) -> FolioResult<()> {
    config.generation = apply_overrides(&config.generation, &args)?;
    config.validate()?;

    let outline = load_source(&args.outline).await?;
    let instructions = match &args.instructions {
        Some(arg) => load_source(arg).await?,
        None => String::new(),
    };
    let book = BookBuilder::default()
        .outline(outline)
        .instructions(instructions)
        .genre(config.generation.genre().clone())
        .build()
        .map_err(|e| ConfigError::new(e.to_string()))?;

    let provider = config.build_provider(config.generation.provider())?;
    let parser = ResponseParser::new(config.rule_chain()?);
    let mut run = write_book(
        provider.as_ref(),
        RunContext::new(book),
        &config.generation,
        &parser,
    )
    .await?;

    let proofread = args.proofread.then_some(args.decisions);
    save_and_proofread(&config, &mut run.book, &args.output, proofread).await?;

    let summary = run.metrics.summary();
    println!("{}", summary);
    if let Some(path) = &args.summary_json {
        write_summary(path, &summary).await?;
        info!(path = %path.display(), "Summary written");
    }
    Ok(())
}
