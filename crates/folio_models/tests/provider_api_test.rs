//! Calls against real provider APIs. Run with `--features api`.

use folio_interface::ProviderAdapter;
use folio_models::{CallSettings, ProviderConfig, ProviderKind, build_provider};
use std::sync::Arc;

fn provider(
    name: &str,
    kind: ProviderKind,
    model: &str,
) -> anyhow::Result<Arc<dyn ProviderAdapter>> {
    let _ = dotenvy::dotenv();
    let config = ProviderConfig::new(kind, model);
    Ok(build_provider(name, &config, &CallSettings::default())?)
}

async fn exercise(adapter: &dyn ProviderAdapter) -> anyhow::Result<()> {
    let text = adapter.generate("Say 'test' and nothing else.", 1).await?;
    assert!(!text.is_empty());

    let mut session = adapter
        .open_session("Outline:\nA lighthouse keeper finds a message in a bottle.")
        .await?;
    let first = adapter
        .generate_with_memory("Write one sentence opening the story.", &session)
        .await?;
    session.append_transcript(&format!("[Fragment 1]\n{}\n\n", first));
    let second = adapter
        .generate_with_memory("Write the next sentence.", &session)
        .await?;
    assert!(!second.is_empty());
    adapter.close_session(&session).await?;

    let findings = adapter
        .scan_patterns(
            "Return a JSON array of objects with keys match, sentence, sentence_index for every \
             occurrence of 'dark' in:\n[1] The cave was dark.\n[2] The sun was bright.",
        )
        .await?;
    println!("{} findings", findings.len());
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_openai_round_trip() -> anyhow::Result<()> {
    exercise(provider("openai", ProviderKind::OpenaiCompat, "gpt-4o-mini")?.as_ref()).await
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_anthropic_round_trip() -> anyhow::Result<()> {
    exercise(provider("anthropic", ProviderKind::Anthropic, "claude-3-5-haiku-latest")?.as_ref())
        .await
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_gemini_round_trip() -> anyhow::Result<()> {
    exercise(provider("gemini", ProviderKind::Gemini, "gemini-2.0-flash")?.as_ref()).await
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_assistants_round_trip() -> anyhow::Result<()> {
    exercise(provider("assistants", ProviderKind::Assistants, "gpt-4o-mini")?.as_ref()).await
}
