//! Layered `folio.toml` configuration.

use config::{Config, File, FileFormat};
use folio_error::{ConfigError, FolioError, FolioResult};
use folio_interface::ProviderAdapter;
use folio_models::{CallSettings, ProviderConfig, build_provider};
use folio_narrative::{GenerationConfig, RuleChain, RuleSpec};
use folio_proofread::ProofreadConfig;
use folio_rate_limit::{PacingConfig, PollingConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../folio.toml");

/// Top-level Folio configuration.
///
/// Loaded with precedence, later sources overriding earlier ones:
/// 1. Bundled defaults (`folio.toml` shipped with the binary)
/// 2. `~/.config/folio/folio.toml`
/// 3. `./folio.toml`
/// 4. An explicit `--config` file
///
/// # Example
///
/// ```no_run
/// use folio::FolioConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FolioConfig::load(None)?;
/// config.validate()?;
/// let provider = config.build_provider(config.generation.provider())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolioConfig {
    /// Provider name to adapter settings
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Retry schedule for every provider call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pause after every successful call
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Completion polling for job-based providers
    #[serde(default)]
    pub polling: PollingConfig,

    /// Generation run settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Ordered response normalization rules; empty means the standard chain
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    /// Proofreading settings
    #[serde(default)]
    pub proofread: ProofreadConfig,
}

impl FolioConfig {
    /// Load configuration from a single file, without the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FolioResult<Self> {
        debug!("Loading configuration from file");
        Self::from_builder(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> FolioResult<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    /// Load the layered configuration.
    ///
    /// User config files are optional and silently skipped if absent; an
    /// explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source cannot be parsed.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> FolioResult<Self> {
        debug!("Loading configuration: explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/folio/folio.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("folio").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> FolioResult<Self> {
        builder
            .build()
            .map_err(|e| {
                FolioError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FolioError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Shared call settings for adapters.
    pub fn call_settings(&self) -> CallSettings {
        CallSettings {
            retry: self.retry.clone(),
            pacing: self.pacing.clone(),
            polling: self.polling.clone(),
        }
    }

    /// Settings for the named provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the provider if it is unknown.
    pub fn provider(&self, name: &str) -> FolioResult<&ProviderConfig> {
        self.providers.get(name).ok_or_else(|| {
            ConfigError::new(format!(
                "Unknown provider '{}' (configured: {})",
                name,
                self.providers.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
            .into()
        })
    }

    /// Build the adapter for the named provider.
    ///
    /// # Errors
    ///
    /// Fails for unknown providers and missing API keys.
    pub fn build_provider(&self, name: &str) -> FolioResult<Arc<dyn ProviderAdapter>> {
        build_provider(name, self.provider(name)?, &self.call_settings())
    }

    /// Build adapters for several providers, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first provider that cannot be built.
    pub fn build_providers(&self, names: &[String]) -> FolioResult<Vec<Arc<dyn ProviderAdapter>>> {
        names.iter().map(|name| self.build_provider(name)).collect()
    }

    /// Compile the configured rule chain.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid pattern.
    pub fn rule_chain(&self) -> FolioResult<RuleChain> {
        if self.rules.is_empty() {
            Ok(RuleChain::standard())
        } else {
            RuleChain::from_specs(&self.rules)
        }
    }

    /// Check every section before any provider is called.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: bad retry limits, unusable
    /// generation or proofreading settings, references to unknown
    /// providers, or rule patterns that do not compile.
    pub fn validate(&self) -> FolioResult<()> {
        self.retry.validate().map_err(ConfigError::new)?;
        self.generation.validate()?;
        self.provider(self.generation.provider())?;
        self.proofread.validate()?;
        for name in self.proofread.providers() {
            self.provider(name)?;
        }
        self.rule_chain()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_are_valid() {
        let config = FolioConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.pacing.post_call_delay_ms(), 1000);
        assert!(!config.rules.is_empty());
    }

    #[test]
    fn test_unknown_provider_is_named() {
        let err = FolioConfig::default().provider("nowhere").unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'nowhere'"));
    }
}
