//! Reading source text and writing finished books.

use folio_core::{Book, RunSummary};
use folio_error::{FolioResult, IoError, JsonError};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Resolve an outline or instructions argument.
///
/// An argument naming an existing file is read; anything else is taken as
/// the text itself.
///
/// # Errors
///
/// Fails only when the argument names a file that cannot be read.
#[instrument(skip(arg), fields(len = arg.len()))]
pub async fn load_source(arg: &str) -> FolioResult<String> {
    let path = Path::new(arg);
    if arg.trim().is_empty() || !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Using argument as literal text");
        return Ok(arg.to_string());
    }
    if !path.is_file() {
        return Err(IoError::new(format!("{} is not a file", path.display())).into());
    }
    debug!(path = %path.display(), "Reading source file");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| IoError::new(format!("Failed to read {}: {}", path.display(), e)).into())
}

/// Write the book as Markdown.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
#[instrument(skip(book), fields(path = %path.display(), chapters = book.chapters().len()))]
pub async fn write_markdown(path: &Path, book: &Book) -> FolioResult<()> {
    write_text(path, &book.to_markdown()).await?;
    info!("Book written");
    Ok(())
}

/// Write plain text, replacing any existing file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub async fn write_text(path: &Path, text: &str) -> FolioResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            IoError::new(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|e| IoError::new(format!("Failed to write {}: {}", path.display(), e)).into())
}

/// Write the run summary as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn write_summary(path: &Path, summary: &RunSummary) -> FolioResult<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| JsonError::new(format!("Failed to serialize summary: {}", e)))?;
    write_text(path, &json).await
}
