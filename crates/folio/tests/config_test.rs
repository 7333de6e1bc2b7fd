//! Tests for layered configuration loading.

use folio::{FolioConfig, PatternAction, ProviderKind, Segmentation};
use std::fs;

const OVERRIDE: &str = r#"
[providers.local]
kind = "openai_compat"
model = "llama3"
base_url = "http://localhost:11434/v1"
api_key_env = "LOCAL_KEY"

[retry]
max_attempts = 2
backoff_factor = 2

[generation]
provider = "local"
fragments = 5

[proofread]
providers = ["local", "openai"]
segmentation = "plain"
"#;

#[test]
fn test_explicit_file_overrides_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("folio.toml");
    fs::write(&path, OVERRIDE)?;

    let config = FolioConfig::load(Some(&path))?;
    config.validate()?;

    // Overridden values
    assert_eq!(config.retry.max_attempts(), 2);
    assert_eq!(config.retry.backoff_factor(), 2);
    assert_eq!(config.generation.provider(), "local");
    assert_eq!(config.generation.fragments(), 5);
    assert_eq!(config.proofread.segmentation(), Segmentation::Plain);

    // Untouched keys keep the bundled values
    assert_eq!(config.retry.delay_ms(), 10_000);
    assert_eq!(config.pacing.post_call_delay_ms(), 1_000);
    assert!(config.providers.contains_key("openai"));
    assert!(config.providers.contains_key("anthropic"));

    let local = config.provider("local")?;
    assert_eq!(local.kind(), ProviderKind::OpenaiCompat);
    assert_eq!(local.key_env(), "LOCAL_KEY");
    Ok(())
}

#[test]
fn test_from_file_without_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("minimal.toml");
    fs::write(
        &path,
        r#"
        [providers.claude]
        kind = "anthropic"
        model = "claude-3-5-haiku-latest"

        [generation]
        provider = "claude"

        [[proofread.patterns]]
        id = "heart raced"
        description = "Racing hearts"
        action = "delete"
        "#,
    )?;

    let config = FolioConfig::from_file(&path)?;
    config.validate()?;

    assert_eq!(config.providers.len(), 1);
    assert!(config.rules.is_empty());
    assert_eq!(config.rule_chain()?.len(), 2);
    assert_eq!(config.retry.max_attempts(), 5);
    assert_eq!(config.generation.chapters(), 1);
    assert_eq!(
        config.proofread.pattern("heart raced").and_then(|p| p.action()),
        Some(PatternAction::Delete)
    );
    Ok(())
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = FolioConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(result.is_err());
}

#[test]
fn test_unknown_generation_provider_rejected() {
    let config = FolioConfig::from_toml_str(
        r#"
        [generation]
        provider = "nowhere"
        "#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("nowhere"));
}

#[test]
fn test_unknown_scan_provider_rejected() {
    let config = FolioConfig::from_toml_str(
        r#"
        [providers.openai]
        kind = "openai_compat"
        model = "gpt-4o-mini"

        [proofread]
        providers = ["openai", "ghost"]
        "#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_zero_fragments_rejected() {
    let config = FolioConfig::from_toml_str(
        r#"
        [providers.openai]
        kind = "openai_compat"
        model = "gpt-4o-mini"

        [generation]
        fragments = 0
        "#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_rule_pattern_rejected() {
    let config = FolioConfig::from_toml_str(
        r#"
        [providers.openai]
        kind = "openai_compat"
        model = "gpt-4o-mini"

        [[rules]]
        kind = "deletion"
        pattern = "(unclosed"
        "#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Invalid rule pattern"));
}

#[test]
fn test_zero_retry_attempts_rejected() {
    let config = FolioConfig::from_toml_str(
        r#"
        [providers.openai]
        kind = "openai_compat"
        model = "gpt-4o-mini"

        [retry]
        max_attempts = 0
        "#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_attempts"));
}

#[test]
fn test_missing_api_key_names_variable() {
    let config = FolioConfig::from_toml_str(
        r#"
        [providers.local]
        kind = "openai_compat"
        model = "llama3"
        api_key_env = "FOLIO_TEST_KEY_THAT_IS_NEVER_SET"
        "#,
    )
    .unwrap();
    let err = config.build_provider("local").err().unwrap();
    assert!(err.to_string().contains("FOLIO_TEST_KEY_THAT_IS_NEVER_SET"));
}
