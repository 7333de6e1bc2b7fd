//! Trait definition for text-generation backends.

use async_trait::async_trait;
use folio_core::{ProviderSession, RawMatch};
use folio_error::FolioResult;

/// Uniform capability interface over heterogeneous generation backends.
///
/// Adapters own authentication, transport and retry. A call that returns
/// `Err` has already exhausted the adapter's retry budget or failed
/// permanently.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name as configured (e.g. "openai", "anthropic").
    fn provider_name(&self) -> &str;

    /// Model identifier.
    fn model_name(&self) -> &str;

    /// Whether generation should run through a session opened at chapter start.
    ///
    /// Providers returning `false` are driven through [`generate`](Self::generate)
    /// when memory is disabled; all providers support sessions.
    fn needs_persistent_context(&self) -> bool {
        false
    }

    /// Open a chapter session seeded with reference material.
    async fn open_session(&self, reference: &str) -> FolioResult<ProviderSession>;

    /// Release provider-side state held by a session.
    async fn close_session(&self, session: &ProviderSession) -> FolioResult<()>;

    /// Generate text without memory.
    ///
    /// `fragment_index` is 1-based and only used for labeling.
    async fn generate(&self, prompt: &str, fragment_index: usize) -> FolioResult<String>;

    /// Generate text continuing the conversation held by `session`.
    async fn generate_with_memory(
        &self,
        prompt: &str,
        session: &ProviderSession,
    ) -> FolioResult<String>;

    /// Run an analysis prompt and return the structured items of the reply.
    ///
    /// Unparseable or empty replies fail with a malformed provider error.
    async fn scan_patterns(&self, prompt: &str) -> FolioResult<Vec<RawMatch>>;

    /// Count tokens in `text`.
    fn count_tokens(&self, text: &str) -> u64 {
        (text.len() / 4).max(1) as u64
    }
}
