//! Configuration check command.

use folio::{FolioConfig, FolioResult};

/// Validate the configuration and report what a run would use.
pub fn run_check_config(config: &FolioConfig) -> FolioResult<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("Providers:");
    for (name, provider) in &config.providers {
        let key = if std::env::var(provider.key_env()).is_ok_and(|k| !k.trim().is_empty()) {
            "set"
        } else {
            "missing"
        };
        println!(
            "  {} ({}, {}): {} {}",
            name,
            provider.kind(),
            provider.model(),
            provider.key_env(),
            key
        );
    }
    println!(
        "Generation: {} chapters x {} fragments with {} (memory {})",
        config.generation.chapters(),
        config.generation.fragments(),
        config.generation.provider(),
        if config.generation.use_memory() { "on" } else { "off" },
    );
    println!(
        "Rules: {}",
        if config.rules.is_empty() {
            "standard chain".to_string()
        } else {
            format!("{} configured", config.rules.len())
        }
    );
    println!(
        "Proofread: {} patterns, scanners [{}]",
        config.proofread.patterns().len(),
        config.proofread.providers().join(", ")
    );
    Ok(())
}
