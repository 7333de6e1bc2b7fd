//! Fragment-by-fragment generation of one chapter.

use crate::prompts::same_words;
use crate::{
    FramedPrompt, GenerationConfig, MemoryContext, PromptVars, ResponseParser, RuleState,
};
use folio_core::{Chapter, Fragment, RunMetrics};
use folio_error::{FolioError, FolioResult, GenerationError};
use folio_interface::ProviderAdapter;
use tracing::{debug, info, instrument, warn};

/// Without a session the reference material travels in the prompt itself.
fn with_reference(reference: &str, prompt: String, has_session: bool) -> String {
    if has_session || reference.trim().is_empty() {
        prompt
    } else {
        format!("{}\n\n{}", reference.trim(), prompt)
    }
}

/// Where a chapter is in its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ChapterPhase {
    /// Session not yet open
    #[display("Init")]
    Init,
    /// Generating the given 1-based fragment
    #[display("Generating({})", _0)]
    Generating(usize),
    /// All fragments generated, session released
    #[display("Done")]
    Done,
}

/// What one fragment step produced.
enum Reply {
    /// Raw provider text
    Text(String),
    /// The provider echoed the prompt twice
    Echoed,
}

/// Drives the generation loop for one chapter.
///
/// Opens a session at `Init` when memory is enabled or the provider needs
/// persistent context, generates exactly the configured number of fragments,
/// then releases the session. Every provider failure that reaches the
/// orchestrator has exhausted the adapter's retries and aborts the chapter
/// with an error naming the stage and the provider.
pub struct FragmentOrchestrator<'a> {
    provider: &'a dyn ProviderAdapter,
    parser: &'a ResponseParser,
    config: &'a GenerationConfig,
}

impl<'a> FragmentOrchestrator<'a> {
    /// Create an orchestrator.
    pub fn new(
        provider: &'a dyn ProviderAdapter,
        parser: &'a ResponseParser,
        config: &'a GenerationConfig,
    ) -> Self {
        Self {
            provider,
            parser,
            config,
        }
    }

    /// Generate chapter `number` from `reference` material.
    ///
    /// # Errors
    ///
    /// Returns a fatal generation error if a provider call fails.
    #[instrument(
        skip(self, reference, rules, metrics),
        fields(provider = %self.provider.provider_name(), fragments = self.config.fragments())
    )]
    pub async fn write_chapter(
        &self,
        number: usize,
        reference: &str,
        rules: &mut RuleState,
        metrics: &mut RunMetrics,
    ) -> FolioResult<Chapter> {
        debug!(chapter = number, phase = %ChapterPhase::Init, "Starting chapter");

        let needs_session = self.config.use_memory() || self.provider.needs_persistent_context();
        let mut memory = if needs_session {
            let session = self
                .provider
                .open_session(reference)
                .await
                .map_err(|e| self.fatal(format!("chapter {} session", number), e))?;
            debug!(handle = %session.handle(), "Opened session");
            Some(MemoryContext::new(session))
        } else {
            None
        };

        let result = self
            .generate_fragments(number, reference, memory.as_mut(), rules, metrics)
            .await;

        if let Some(memory) = memory {
            let session = memory.into_session();
            if let Err(e) = self.provider.close_session(&session).await {
                warn!(chapter = number, error = %e, "Failed to release session");
            }
        }

        let chapter = result?;
        debug!(chapter = number, phase = %ChapterPhase::Done, "Chapter sealed");
        metrics.record_chapter(
            number,
            chapter.word_count(),
            chapter.fragments().len(),
            chapter.echoed_count(),
        );
        info!(
            chapter = number,
            words = chapter.word_count(),
            echoed = chapter.echoed_count(),
            "Chapter complete"
        );
        Ok(chapter)
    }

    async fn generate_fragments(
        &self,
        number: usize,
        reference: &str,
        mut memory: Option<&mut MemoryContext>,
        rules: &mut RuleState,
        metrics: &mut RunMetrics,
    ) -> FolioResult<Chapter> {
        let mut chapter = Chapter::new(number);

        for index in 1..=self.config.fragments() {
            debug!(chapter = number, phase = %ChapterPhase::Generating(index), "Fragment step");
            let vars = PromptVars {
                chapter: number,
                fragment: index,
                fragments: self.config.fragments(),
                genre: self.config.genre(),
            };
            let prompt = self.config.prompts().framed(vars);

            let reply = self
                .fragment_reply(&prompt, vars, reference, memory.as_deref(), metrics)
                .await
                .map_err(|e| self.fatal(format!("chapter {} fragment {}", number, index), e))?;

            match reply {
                Reply::Text(raw) => {
                    chapter.push(self.parser.parse(&raw, rules));
                    if let Some(memory) = memory.as_deref_mut() {
                        if self.config.use_memory() {
                            memory.record(index, &raw);
                        }
                    }
                }
                Reply::Echoed => {
                    warn!(
                        chapter = number,
                        fragment = index,
                        "Provider echoed the prompt twice, leaving fragment empty"
                    );
                    chapter.push(Fragment::echoed_placeholder());
                }
            }
        }

        Ok(chapter)
    }

    /// Ask for one fragment, with a single corrective retry on echo.
    async fn fragment_reply(
        &self,
        prompt: &FramedPrompt,
        vars: PromptVars<'_>,
        reference: &str,
        memory: Option<&MemoryContext>,
        metrics: &mut RunMetrics,
    ) -> FolioResult<Reply> {
        let index = vars.fragment;
        let sent = with_reference(reference, prompt.text(), memory.is_some());
        let is_echo = |reply: &str| prompt.is_echo(reply) || same_words(reply, &sent);

        let reply = self.call(&sent, index, memory, metrics).await?;
        if !is_echo(&reply) {
            return Ok(Reply::Text(reply));
        }

        warn!(fragment = index, "Provider echoed the prompt, requesting a correction");
        let corrective = with_reference(
            reference,
            self.config.prompts().corrective(prompt, vars),
            memory.is_some(),
        );
        let reply = self.call(&corrective, index, memory, metrics).await?;
        if is_echo(&reply) || same_words(&reply, &corrective) {
            Ok(Reply::Echoed)
        } else {
            Ok(Reply::Text(reply))
        }
    }

    async fn call(
        &self,
        text: &str,
        index: usize,
        memory: Option<&MemoryContext>,
        metrics: &mut RunMetrics,
    ) -> FolioResult<String> {
        let reply = match memory {
            Some(memory) => self.provider.generate_with_memory(text, memory.session()).await?,
            None => self.provider.generate(text, index).await?,
        };
        let context = memory
            .map(|m| m.session().transcript().as_str())
            .filter(|t| !t.is_empty())
            .map_or(0, |t| self.provider.count_tokens(t));
        metrics.record_tokens(
            self.provider.count_tokens(text) + context,
            self.provider.count_tokens(&reply),
        );
        Ok(reply)
    }

    fn fatal(&self, stage: String, err: FolioError) -> FolioError {
        GenerationError::fatal(stage, self.provider.provider_name(), err.to_string()).into()
    }
}
