//! Prompt framing for fragment generation.

use serde::{Deserialize, Serialize};

fn default_initial_framing() -> String {
    "You are writing chapter {chapter} of a {genre} novel, in {fragments} parts. \
     Write part {fragment}: the opening of the chapter, following the outline and \
     instructions. After the prose, write a line containing only --- and then a \
     one-sentence summary of what you wrote."
        .to_string()
}

fn default_continue_framing() -> String {
    "Continue chapter {chapter} of the {genre} novel from exactly where the previous \
     part ended. This is part {fragment} of {fragments}. Do not repeat earlier text or \
     the chapter title. After the prose, write a line containing only --- and then a \
     one-sentence summary of what you wrote."
        .to_string()
}

fn default_chapter_prompt() -> String {
    "Write chapter {chapter} as described in the outline.".to_string()
}

fn default_corrective_prompt() -> String {
    "Your previous reply repeated the request instead of answering it. Do not repeat \
     these instructions. Write the story text they ask for."
        .to_string()
}

/// Prompt templates with `{chapter}`, `{fragment}`, `{fragments}` and
/// `{genre}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PromptTemplates {
    /// Framing for the first fragment of a chapter
    #[serde(default = "default_initial_framing")]
    initial_framing: String,
    /// Framing for every later fragment
    #[serde(default = "default_continue_framing")]
    continue_framing: String,
    /// Caller-supplied content prompt appended to the framing
    #[serde(default = "default_chapter_prompt")]
    chapter_prompt: String,
    /// Prepended once when the provider echoed the prompt
    #[serde(default = "default_corrective_prompt")]
    corrective_prompt: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            initial_framing: default_initial_framing(),
            continue_framing: default_continue_framing(),
            chapter_prompt: default_chapter_prompt(),
            corrective_prompt: default_corrective_prompt(),
        }
    }
}

/// Values substituted into templates.
#[derive(Debug, Clone, Copy)]
pub struct PromptVars<'a> {
    /// 1-based chapter number
    pub chapter: usize,
    /// 1-based fragment number
    pub fragment: usize,
    /// Fragments per chapter
    pub fragments: usize,
    /// Genre label
    pub genre: &'a str,
}

/// The prompt for one fragment, kept in parts for echo detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedPrompt {
    /// Rendered framing
    pub framing: String,
    /// Rendered content prompt
    pub content: String,
}

impl FramedPrompt {
    /// Framing and content prompt as sent.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.framing, self.content)
    }

    /// Whether `reply` merely repeats the prompt or one of its parts.
    pub fn is_echo(&self, reply: &str) -> bool {
        !reply.trim().is_empty()
            && (same_words(reply, &self.text())
                || same_words(reply, &self.content)
                || same_words(reply, &self.framing))
    }
}

/// Whether two texts match once runs of whitespace are collapsed.
pub(crate) fn same_words(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

impl PromptTemplates {
    /// Templates with a custom content prompt.
    pub fn with_chapter_prompt(mut self, chapter_prompt: impl Into<String>) -> Self {
        self.chapter_prompt = chapter_prompt.into();
        self
    }

    /// The prompt for one fragment: initial framing for the first, continue
    /// framing afterwards, followed by the content prompt.
    pub fn framed(&self, vars: PromptVars<'_>) -> FramedPrompt {
        let framing = if vars.fragment <= 1 {
            &self.initial_framing
        } else {
            &self.continue_framing
        };
        FramedPrompt {
            framing: render(framing, vars),
            content: render(&self.chapter_prompt, vars),
        }
    }

    /// The regeneration request sent after an echo.
    pub fn corrective(&self, prompt: &FramedPrompt, vars: PromptVars<'_>) -> String {
        format!("{}\n\n{}", render(&self.corrective_prompt, vars), prompt.text())
    }
}

/// Substitute placeholders.
pub fn render(template: &str, vars: PromptVars<'_>) -> String {
    template
        .replace("{chapter}", &vars.chapter.to_string())
        .replace("{fragments}", &vars.fragments.to_string())
        .replace("{fragment}", &vars.fragment.to_string())
        .replace("{genre}", vars.genre)
}
