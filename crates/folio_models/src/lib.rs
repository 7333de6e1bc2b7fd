//! Provider adapters for Folio.
//!
//! Every adapter implements [`folio_interface::ProviderAdapter`] and owns a
//! [`folio_rate_limit::CallPolicy`], so callers never retry or pace calls
//! themselves.
//!
//! # Available Providers
//!
//! - **OpenAI-compatible chat** - OpenAI, Groq, OpenRouter, local servers
//! - **Anthropic** - Messages API, reference material as system prompt
//! - **Gemini** - reference material held in a per-chapter context cache
//! - **Assistants** - OpenAI threads with native memory and run polling
//!
//! # Example
//!
//! ```no_run
//! use folio_models::{CallSettings, ProviderConfig, ProviderKind, build_provider};
//!
//! # async fn demo() -> folio_error::FolioResult<()> {
//! let config = ProviderConfig::new(ProviderKind::OpenaiCompat, "gpt-4o-mini");
//! let provider = build_provider("openai", &config, &CallSettings::default())?;
//! let text = provider.generate("Write one sentence about a cave.", 1).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod anthropic;
mod assistants;
mod conversation;
mod extraction;
mod factory;
mod gemini;
mod http;
mod metrics;
mod openai_compat;
mod tokens;

pub use anthropic::{
    ANTHROPIC_BASE_URL, AnthropicClient, AnthropicContentBlock, AnthropicMessage,
    AnthropicRequest, AnthropicRequestBuilder, AnthropicResponse, AnthropicUsage,
    DEFAULT_MAX_TOKENS,
};
pub use assistants::{AssistantsClient, MessageList, Run, ThreadMessage};
pub use extraction::{extract_json, parse_findings};
pub use factory::{CallSettings, ProviderConfig, ProviderKind, build_provider, build_with_key};
pub use gemini::{
    DEFAULT_CACHE_TTL, GEMINI_BASE_URL, GeminiClient, GenerateContentRequest,
    GenerateContentResponse,
};
pub use metrics::{LlmMetrics, classify_error};
pub use openai_compat::{
    ChatChoice, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, ChatUsage,
    OPENAI_BASE_URL, OpenAICompatibleClient,
};
pub use tokens::{count_tokens, estimate_tokens};
