use crate::conversation::Conversation;
use crate::gemini::{
    CachedContent, Content, CreateCachedContent, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig,
};
use crate::http::{non_empty, send_json, send_unit};
use crate::{LlmMetrics, count_tokens, parse_findings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{MemoryHandle, ProviderSession, RawMatch};
use folio_error::FolioResult;
use folio_interface::ProviderAdapter;
use folio_rate_limit::CallPolicy;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default endpoint root for the Gemini API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default lifetime of a chapter's cached reference material.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Google Gemini client.
///
/// Reference material is uploaded once per chapter as a `cachedContents`
/// resource and referenced by every fragment request of that chapter. The
/// fragment history still travels as an explicit transcript. If the cache
/// cannot be created (e.g. the material is below the model's minimum cache
/// size) the session falls back to sending the reference as a system
/// instruction on every call.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    generation_config: GenerationConfig,
    cache_ttl: Duration,
    policy: CallPolicy,
}

impl GeminiClient {
    /// Creates a new Gemini client.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        debug!(model = %model, "Creating new Gemini client");
        Self {
            client: Client::new(),
            name: "gemini".to_string(),
            api_key: api_key.into(),
            model,
            base_url: GEMINI_BASE_URL.to_string(),
            generation_config: GenerationConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            policy: CallPolicy::default(),
        }
    }

    /// Rename the provider.
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
        self.generation_config = GenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        };
        self
    }

    /// Set the cache lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Replace the call policy.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    async fn complete_once(
        &self,
        conversation: &Conversation,
        cache: Option<&str>,
    ) -> FolioResult<String> {
        let request = GenerateContentRequest::from_conversation(
            conversation,
            cache.map(str::to_string),
            self.generation_config.clone(),
        );
        let response: GenerateContentResponse = send_json(
            &self.name,
            &self.model,
            self.client
                .post(format!("{}/{}:generateContent", self.base_url, self.model_path()))
                .header("x-goog-api-key", &self.api_key)
                .json(&request),
        )
        .await?;

        if let Some(usage) = &response.usage_metadata {
            LlmMetrics::get().record_tokens(
                &self.name,
                &self.model,
                usage.prompt_token_count,
                usage.candidates_token_count,
            );
            debug!(cached_tokens = usage.cached_content_token_count, "Gemini usage");
        }
        non_empty(&self.name, response.text())
    }

    #[instrument(
        skip(self, conversation),
        fields(provider = %self.name, cached = cache.is_some())
    )]
    async fn complete(
        &self,
        conversation: &Conversation,
        cache: Option<&str>,
    ) -> FolioResult<String> {
        self.policy
            .execute(|| self.complete_once(conversation, cache))
            .await
    }

    async fn create_cache(&self, reference: &str) -> FolioResult<CachedContent> {
        let body = CreateCachedContent {
            model: self.model_path(),
            system_instruction: Content::text(None, reference),
            ttl: format!("{}s", self.cache_ttl.as_secs()),
        };
        self.policy
            .execute(|| {
                send_json(
                    &self.name,
                    &self.model,
                    self.client
                        .post(format!("{}/cachedContents", self.base_url))
                        .header("x-goog-api-key", &self.api_key)
                        .json(&body),
                )
            })
            .await
    }

    fn expiry(&self, cache: &CachedContent) -> DateTime<Utc> {
        cache
            .expire_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| {
                Utc::now()
                    + chrono::Duration::from_std(self.cache_ttl)
                        .unwrap_or_else(|_| chrono::Duration::seconds(0))
            })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn needs_persistent_context(&self) -> bool {
        true
    }

    #[instrument(skip(self, reference), fields(provider = %self.name))]
    async fn open_session(&self, reference: &str) -> FolioResult<ProviderSession> {
        if reference.trim().is_empty() {
            return Ok(ProviderSession::new(&self.name, MemoryHandle::Transcript, reference));
        }

        match self.create_cache(reference).await {
            Ok(cache) => {
                let expires_at = self.expiry(&cache);
                info!(cache = %cache.name, %expires_at, "Created cached reference material");
                Ok(ProviderSession::new(
                    &self.name,
                    MemoryHandle::Cache { name: cache.name },
                    reference,
                )
                .with_expiry(expires_at))
            }
            Err(e) => {
                warn!(error = %e, "Context cache unavailable, sending reference with each call");
                Ok(ProviderSession::new(&self.name, MemoryHandle::Transcript, reference))
            }
        }
    }

    async fn close_session(&self, session: &ProviderSession) -> FolioResult<()> {
        let MemoryHandle::Cache { name } = session.handle() else {
            return Ok(());
        };
        debug!(cache = %name, "Deleting cached reference material");
        send_unit(
            &self.name,
            &self.model,
            self.client
                .delete(format!("{}/{}", self.base_url, name))
                .header("x-goog-api-key", &self.api_key),
        )
        .await
    }

    async fn generate(&self, prompt: &str, fragment_index: usize) -> FolioResult<String> {
        debug!(fragment_index, "Generating without memory");
        self.complete(&Conversation::single(prompt), None).await
    }

    async fn generate_with_memory(
        &self,
        prompt: &str,
        session: &ProviderSession,
    ) -> FolioResult<String> {
        let conversation = Conversation::from_session(prompt, session);
        match session.handle() {
            MemoryHandle::Cache { name } if !session.is_expired_at(Utc::now()) => {
                self.complete(&conversation.without_system(), Some(name.as_str())).await
            }
            MemoryHandle::Cache { name } => {
                warn!(cache = %name, "Cached reference expired, sending it inline");
                self.complete(&conversation, None).await
            }
            _ => self.complete(&conversation, None).await,
        }
    }

    #[instrument(skip(self, prompt), fields(provider = %self.name))]
    async fn scan_patterns(&self, prompt: &str) -> FolioResult<Vec<RawMatch>> {
        let conversation = Conversation::single(prompt);
        self.policy
            .execute(|| async {
                let reply = self.complete_once(&conversation, None).await?;
                parse_findings(&self.name, &reply)
            })
            .await
    }

    fn count_tokens(&self, text: &str) -> u64 {
        count_tokens(text)
    }
}
