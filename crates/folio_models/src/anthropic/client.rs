use crate::anthropic::{AnthropicRequest, AnthropicResponse, DEFAULT_MAX_TOKENS, to_messages};
use crate::conversation::Conversation;
use crate::http::{non_empty, send_json};
use crate::{LlmMetrics, count_tokens, parse_findings};
use async_trait::async_trait;
use folio_core::{MemoryHandle, ProviderSession, RawMatch};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::ProviderAdapter;
use folio_rate_limit::CallPolicy;
use reqwest::Client;
use tracing::{debug, instrument};

/// Default endpoint root for Anthropic.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: Option<f32>,
    policy: CallPolicy,
}

impl AnthropicClient {
    /// Creates a new Anthropic client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `model` - Model identifier (e.g., "claude-3-5-sonnet-20241022")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        debug!(model = %model, "Creating new Anthropic client");
        Self {
            client: Client::new(),
            name: "anthropic".to_string(),
            api_key: api_key.into(),
            model,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            policy: CallPolicy::default(),
        }
    }

    /// Rename the provider, for configurations with several Anthropic entries.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Point the client at another endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set sampling options.
    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        self.temperature = temperature;
        self
    }

    /// Replace the call policy.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn convert_request(&self, conversation: &Conversation) -> FolioResult<AnthropicRequest> {
        AnthropicRequest::builder()
            .model(self.model.clone())
            .max_tokens(self.max_tokens)
            .system(conversation.system.clone())
            .messages(to_messages(conversation))
            .temperature(self.temperature)
            .build()
            .map_err(|e| {
                ProviderError::new(&self.name, ProviderErrorKind::Unsupported(e.to_string())).into()
            })
    }

    async fn complete_once(&self, conversation: &Conversation) -> FolioResult<String> {
        let request = self.convert_request(conversation)?;
        let response: AnthropicResponse = send_json(
            &self.name,
            &self.model,
            self.client
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        if let Some(usage) = &response.usage {
            LlmMetrics::get().record_tokens(
                &self.name,
                &self.model,
                usage.input_tokens,
                usage.output_tokens,
            );
        }
        debug!(
            response_id = %response.id,
            stop_reason = ?response.stop_reason,
            "Received response from Anthropic"
        );
        non_empty(&self.name, response.text())
    }

    #[instrument(
        skip(self, conversation),
        fields(provider = %self.name, turns = conversation.turns.len())
    )]
    async fn complete(&self, conversation: &Conversation) -> FolioResult<String> {
        self.policy
            .execute(|| self.complete_once(conversation))
            .await
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn open_session(&self, reference: &str) -> FolioResult<ProviderSession> {
        Ok(ProviderSession::new(&self.name, MemoryHandle::Transcript, reference))
    }

    async fn close_session(&self, _session: &ProviderSession) -> FolioResult<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str, fragment_index: usize) -> FolioResult<String> {
        debug!(fragment_index, "Generating without memory");
        self.complete(&Conversation::single(prompt)).await
    }

    async fn generate_with_memory(
        &self,
        prompt: &str,
        session: &ProviderSession,
    ) -> FolioResult<String> {
        self.complete(&Conversation::from_session(prompt, session)).await
    }

    #[instrument(skip(self, prompt), fields(provider = %self.name))]
    async fn scan_patterns(&self, prompt: &str) -> FolioResult<Vec<RawMatch>> {
        let conversation = Conversation::single(prompt);
        self.policy
            .execute(|| async {
                let reply = self.complete_once(&conversation).await?;
                parse_findings(&self.name, &reply)
            })
            .await
    }

    fn count_tokens(&self, text: &str) -> u64 {
        count_tokens(text)
    }
}
