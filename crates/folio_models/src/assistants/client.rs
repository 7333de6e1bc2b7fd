use crate::assistants::{
    CreateAssistant, CreateRun, CreateThread, MessageList, NewMessage, ObjectRef, Run,
};
use crate::http::{non_empty, send_json, send_unit};
use crate::openai_compat::OPENAI_BASE_URL;
use crate::{LlmMetrics, count_tokens, parse_findings};
use async_trait::async_trait;
use folio_core::{JobStatus, MemoryHandle, ProviderSession, RawMatch};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::ProviderAdapter;
use folio_rate_limit::{CallPolicy, PollPolicy};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// OpenAI Assistants client.
///
/// Memory is native: each chapter gets its own thread, seeded with the
/// reference material. Every fragment posts a message, starts a run, polls
/// the run until it reaches a terminal state and reads back the newest
/// assistant message.
#[derive(Debug)]
pub struct AssistantsClient {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    assistant: OnceCell<String>,
    policy: CallPolicy,
    poll: PollPolicy,
}

impl AssistantsClient {
    /// Creates a new client. An assistant is created on first use unless
    /// one is supplied with [`with_assistant_id`](Self::with_assistant_id).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        debug!(model = %model, "Creating new Assistants client");
        Self {
            client: Client::new(),
            name: "assistants".to_string(),
            api_key: api_key.into(),
            model,
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
            assistant: OnceCell::new(),
            policy: CallPolicy::default(),
            poll: PollPolicy::default(),
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

    /// Use an existing assistant.
    pub fn with_assistant_id(self, assistant_id: impl Into<String>) -> Self {
        Self {
            assistant: OnceCell::new_with(Some(assistant_id.into())),
            ..self
        }
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

    /// Replace the run polling policy.
    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl serde::Serialize + Sync),
    ) -> FolioResult<T> {
        self.policy
            .execute(|| {
                send_json(
                    &self.name,
                    &self.model,
                    self.request(self.client.post(self.url(path)).json(body)),
                )
            })
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> FolioResult<T> {
        self.policy
            .execute(|| {
                send_json(
                    &self.name,
                    &self.model,
                    self.request(self.client.get(self.url(path))),
                )
            })
            .await
    }

    async fn assistant_id(&self) -> FolioResult<&str> {
        let id = self
            .assistant
            .get_or_try_init(|| async {
                let body = CreateAssistant {
                    model: self.model.clone(),
                    name: "folio".to_string(),
                    instructions: None,
                    temperature: self.temperature,
                };
                let assistant: ObjectRef = self.post("assistants", &body).await?;
                info!(assistant = %assistant.id, "Created assistant");
                Ok::<_, folio_error::FolioError>(assistant.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn create_thread(&self, seed: Option<&str>) -> FolioResult<String> {
        let body = CreateThread {
            messages: seed.map(NewMessage::user).into_iter().collect(),
        };
        let thread: ObjectRef = self.post("threads", &body).await?;
        debug!(thread = %thread.id, "Created thread");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> FolioResult<()> {
        send_unit(
            &self.name,
            &self.model,
            self.request(self.client.delete(self.url(&format!("threads/{}", thread_id)))),
        )
        .await
    }

    /// Post a prompt to a thread, run the assistant and read its reply.
    #[instrument(skip(self, prompt), fields(provider = %self.name))]
    async fn run_turn(&self, thread_id: &str, prompt: &str) -> FolioResult<String> {
        let assistant_id = self.assistant_id().await?.to_string();

        let _: ObjectRef = self
            .post(
                &format!("threads/{}/messages", thread_id),
                &NewMessage::user(prompt),
            )
            .await?;

        let run: Run = self
            .post(
                &format!("threads/{}/runs", thread_id),
                &CreateRun {
                    assistant_id,
                    max_completion_tokens: self.max_tokens,
                },
            )
            .await?;
        debug!(run = %run.id, status = %run.status, "Started run");

        let run_path = format!("threads/{}/runs/{}", thread_id, run.id);
        let status = self
            .poll
            .until_terminal(&self.name, || async {
                let current: Run = self.get(&run_path).await?;
                if let (JobStatus::Completed, Some(usage)) = (current.job_status(), &current.usage)
                {
                    LlmMetrics::get().record_tokens(
                        &self.name,
                        &self.model,
                        usage.prompt_tokens,
                        usage.completion_tokens,
                    );
                }
                Ok(current.job_status())
            })
            .await?;

        if !status.is_success() {
            warn!(run = %run.id, %status, "Run ended without completing");
            return Err(ProviderError::new(
                &self.name,
                ProviderErrorKind::JobFailed {
                    status: status.to_string(),
                },
            )
            .into());
        }

        let messages: MessageList = self
            .get(&format!("threads/{}/messages?order=desc&limit=1", thread_id))
            .await?;
        non_empty(&self.name, messages.latest_assistant_text())
    }

    /// One turn on a throwaway thread.
    async fn one_shot(&self, prompt: &str) -> FolioResult<String> {
        let thread_id = self.create_thread(None).await?;
        let result = self.run_turn(&thread_id, prompt).await;
        if let Err(e) = self.delete_thread(&thread_id).await {
            warn!(thread = %thread_id, error = %e, "Failed to delete temporary thread");
        }
        result
    }
}

#[async_trait]
impl ProviderAdapter for AssistantsClient {
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
        let seed = Some(reference.trim()).filter(|r| !r.is_empty());
        let id = self.create_thread(seed).await?;
        Ok(ProviderSession::new(
            &self.name,
            MemoryHandle::Thread { id },
            reference,
        ))
    }

    async fn close_session(&self, session: &ProviderSession) -> FolioResult<()> {
        match session.handle() {
            MemoryHandle::Thread { id } => self.delete_thread(id).await,
            _ => Ok(()),
        }
    }

    async fn generate(&self, prompt: &str, fragment_index: usize) -> FolioResult<String> {
        debug!(fragment_index, "Generating on a temporary thread");
        self.one_shot(prompt).await
    }

    async fn generate_with_memory(
        &self,
        prompt: &str,
        session: &ProviderSession,
    ) -> FolioResult<String> {
        match session.handle() {
            MemoryHandle::Thread { id } => self.run_turn(id, prompt).await,
            other => Err(ProviderError::new(
                &self.name,
                ProviderErrorKind::Unsupported(format!(
                    "assistants session with {} memory",
                    other
                )),
            )
            .into()),
        }
    }

    #[instrument(skip(self, prompt), fields(provider = %self.name))]
    async fn scan_patterns(&self, prompt: &str) -> FolioResult<Vec<RawMatch>> {
        self.policy
            .retry()
            .run(|| async {
                let reply = self.one_shot(prompt).await?;
                parse_findings(&self.name, &reply)
            })
            .await
    }

    fn count_tokens(&self, text: &str) -> u64 {
        count_tokens(text)
    }
}
