//! Tests for source loading and output writing.

use folio::{BookBuilder, Chapter, RunMetrics, load_source, write_markdown, write_summary};

#[tokio::test]
async fn test_existing_file_is_read() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("outline.md");
    std::fs::write(&path, "A miner finds a cave.\n")?;

    let text = load_source(path.to_str().unwrap()).await?;
    assert_eq!(text, "A miner finds a cave.\n");
    Ok(())
}

#[tokio::test]
async fn test_anything_else_is_literal() -> anyhow::Result<()> {
    let text = load_source("A miner finds a cave that hums at night.").await?;
    assert_eq!(text, "A miner finds a cave that hums at night.");

    // Looks like a path, but nothing is there
    let text = load_source("/definitely/not/here/outline.md").await?;
    assert_eq!(text, "/definitely/not/here/outline.md");
    Ok(())
}

#[tokio::test]
async fn test_directory_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(load_source(dir.path().to_str().unwrap()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_markdown_joins_chapters() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out").join("book.md");
    let book = BookBuilder::default()
        .outline("o")
        .chapters(vec![
            Chapter::from_text(1, "**Chapter 1**\n\nThe cave was dark."),
            Chapter::from_text(2, "**Chapter 2**\n\nLight, at last."),
        ])
        .build()?;

    write_markdown(&path, &book).await?;

    let written = std::fs::read_to_string(&path)?;
    assert_eq!(
        written,
        "**Chapter 1**\n\nThe cave was dark.\n\n**Chapter 2**\n\nLight, at last.\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_summary_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("summary.json");
    let mut metrics = RunMetrics::new();
    metrics.record_chapter(1, 120, 3, 0);
    metrics.record_chapter(2, 80, 3, 1);
    metrics.record_tokens(400, 250);

    write_summary(&path, &metrics.summary()).await?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(json["total_words"], 200);
    assert_eq!(json["prompt_tokens"], 400);
    assert_eq!(json["completion_tokens"], 250);
    assert_eq!(json["chapters"].as_array().map(Vec::len), Some(2));
    Ok(())
}
