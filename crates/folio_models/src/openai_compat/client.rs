//! Client for OpenAI-compatible chat completion APIs.

use crate::conversation::Conversation;
use crate::http::{non_empty, send_json};
use crate::openai_compat::{ChatRequest, ChatResponse, to_messages};
use crate::{LlmMetrics, count_tokens, parse_findings};
use async_trait::async_trait;
use folio_core::{MemoryHandle, ProviderSession, RawMatch};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::ProviderAdapter;
use folio_rate_limit::CallPolicy;
use reqwest::Client;
use tracing::{debug, instrument};

/// Default endpoint root for OpenAI.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible chat API (OpenAI, Groq, OpenRouter,
/// local servers).
///
/// Memory is the session transcript replayed as a prior exchange.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    policy: CallPolicy,
}

impl OpenAICompatibleClient {
    /// Creates a new client against the OpenAI endpoint.
    ///
    /// # Arguments
    ///
    /// * `name` - Provider name used in logs and errors
    /// * `api_key` - API key for bearer authentication
    /// * `model` - Model identifier
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let model = model.into();
        debug!(provider = %name, model = %model, "Created OpenAI-compatible client");
        Self {
            client: Client::new(),
            name,
            api_key: api_key.into(),
            model,
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
            policy: CallPolicy::default(),
        }
    }

    /// Point the client at another compatible endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set sampling options.
    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Replace the call policy.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, conversation: &Conversation) -> FolioResult<ChatRequest> {
        ChatRequest::builder()
            .model(self.model.clone())
            .messages(to_messages(conversation))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| {
                ProviderError::new(&self.name, ProviderErrorKind::Unsupported(e.to_string())).into()
            })
    }

    /// One chat completion request, without retry.
    async fn complete_once(&self, conversation: &Conversation) -> FolioResult<String> {
        let request = self.build_request(conversation)?;
        let response: ChatResponse = send_json(
            &self.name,
            &self.model,
            self.client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        if let Some(usage) = &response.usage {
            LlmMetrics::get().record_tokens(
                &self.name,
                &self.model,
                usage.prompt_tokens.unwrap_or_default(),
                usage.completion_tokens.unwrap_or_default(),
            );
        }
        debug!(choices = response.choices.len(), "Received response");
        non_empty(&self.name, response.text())
    }

    /// Run one chat completion under the call policy.
    #[instrument(
        skip(self, conversation),
        fields(provider = %self.name, chars = conversation.len())
    )]
    async fn complete(&self, conversation: &Conversation) -> FolioResult<String> {
        self.policy
            .execute(|| self.complete_once(conversation))
            .await
    }
}

#[async_trait]
impl ProviderAdapter for OpenAICompatibleClient {
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

    #[instrument(skip(self, prompt), fields(provider = %self.name))]
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
