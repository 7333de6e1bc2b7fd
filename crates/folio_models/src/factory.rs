//! Building provider adapters from configuration.

use crate::{AnthropicClient, AssistantsClient, GeminiClient, OpenAICompatibleClient};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::ProviderAdapter;
use folio_rate_limit::{CallPolicy, PacingConfig, PollPolicy, PollingConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Wire protocol spoken by a provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat completions and compatible servers
    OpenaiCompat,
    /// Anthropic Messages
    Anthropic,
    /// Google Gemini with context caching
    Gemini,
    /// OpenAI Assistants threads and runs
    Assistants,
}

impl ProviderKind {
    /// Environment variable holding the API key when none is configured.
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenaiCompat | ProviderKind::Assistants => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// One `[providers.<name>]` table.
///
/// # Example
///
/// ```toml
/// [providers.groq]
/// kind = "openai_compat"
/// model = "llama-3.3-70b-versatile"
/// base_url = "https://api.groq.com/openai/v1"
/// api_key_env = "GROQ_API_KEY"
/// rpm = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProviderConfig {
    /// Wire protocol
    #[getter(copy)]
    kind: ProviderKind,
    /// Model identifier
    model: String,
    /// Environment variable holding the API key
    #[serde(default)]
    api_key_env: Option<String>,
    /// Endpoint root override
    #[serde(default)]
    base_url: Option<String>,
    /// Completion token cap
    #[serde(default)]
    #[getter(copy)]
    max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default)]
    #[getter(copy)]
    temperature: Option<f32>,
    /// Lifetime of cached reference material (gemini)
    #[serde(default)]
    #[getter(copy)]
    cache_ttl_secs: Option<u64>,
    /// Requests per minute cap
    #[serde(default)]
    #[getter(copy)]
    rpm: Option<u32>,
    /// Existing assistant to use (assistants)
    #[serde(default)]
    assistant_id: Option<String>,
}

impl ProviderConfig {
    /// Minimal configuration for a kind and model.
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            api_key_env: None,
            base_url: None,
            max_tokens: None,
            temperature: None,
            cache_ttl_secs: None,
            rpm: None,
            assistant_id: None,
        }
    }

    /// Name of the environment variable the key is read from.
    pub fn key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env())
    }

    /// Read the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or blank.
    pub fn api_key(&self, provider: &str) -> FolioResult<String> {
        let var = self.key_env();
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(
                ProviderError::new(provider, ProviderErrorKind::MissingApiKey(var.to_string()))
                    .into(),
            ),
        }
    }
}

/// Shared call settings applied to every adapter.
#[derive(Debug, Clone, Default)]
pub struct CallSettings {
    /// Retry schedule
    pub retry: RetryConfig,
    /// Post-call pacing
    pub pacing: PacingConfig,
    /// Run polling
    pub polling: PollingConfig,
}

/// Build an adapter for the provider `name`, reading its key from the environment.
///
/// # Errors
///
/// Returns `MissingApiKey` if the key variable is not set.
#[instrument(skip(config, settings), fields(kind = %config.kind()))]
pub fn build_provider(
    name: &str,
    config: &ProviderConfig,
    settings: &CallSettings,
) -> FolioResult<Arc<dyn ProviderAdapter>> {
    let api_key = config.api_key(name)?;
    Ok(build_with_key(name, config, settings, api_key))
}

/// Build an adapter with an explicit key.
pub fn build_with_key(
    name: &str,
    config: &ProviderConfig,
    settings: &CallSettings,
    api_key: String,
) -> Arc<dyn ProviderAdapter> {
    let policy = CallPolicy::new(&settings.retry, &settings.pacing, config.rpm());
    let model = config.model().clone();
    debug!(provider = name, model = %model, "Building provider adapter");

    match config.kind() {
        ProviderKind::OpenaiCompat => {
            let mut client = OpenAICompatibleClient::new(name, api_key, model)
                .with_sampling(config.max_tokens(), config.temperature())
                .with_policy(policy);
            if let Some(base_url) = config.base_url() {
                client = client.with_base_url(base_url);
            }
            Arc::new(client)
        }
        ProviderKind::Anthropic => {
            let mut client = AnthropicClient::new(api_key, model)
                .with_name(name)
                .with_sampling(config.max_tokens(), config.temperature())
                .with_policy(policy);
            if let Some(base_url) = config.base_url() {
                client = client.with_base_url(base_url);
            }
            Arc::new(client)
        }
        ProviderKind::Gemini => {
            let mut client = GeminiClient::new(api_key, model)
                .with_name(name)
                .with_sampling(config.max_tokens(), config.temperature())
                .with_policy(policy);
            if let Some(ttl) = config.cache_ttl_secs() {
                client = client.with_cache_ttl(Duration::from_secs(ttl));
            }
            if let Some(base_url) = config.base_url() {
                client = client.with_base_url(base_url);
            }
            Arc::new(client)
        }
        ProviderKind::Assistants => {
            let mut client = AssistantsClient::new(api_key, model)
                .with_name(name)
                .with_sampling(config.max_tokens(), config.temperature())
                .with_policy(policy)
                .with_poll(PollPolicy::from(&settings.polling));
            if let Some(assistant_id) = config.assistant_id() {
                client = client.with_assistant_id(assistant_id.clone());
            }
            if let Some(base_url) = config.base_url() {
                client = client.with_base_url(base_url);
            }
            Arc::new(client)
        }
    }
}
