//! Generation run settings, the `[generation]` table.

use crate::PromptTemplates;
use folio_error::{FolioResult, GenerationError, GenerationErrorKind};
use serde::{Deserialize, Serialize};

fn default_provider() -> String {
    "openai".to_string()
}

fn default_genre() -> String {
    "literary fiction".to_string()
}

fn default_chapters() -> usize {
    1
}

fn default_fragments() -> usize {
    3
}

fn default_use_memory() -> bool {
    true
}

/// Settings for one generation run.
///
/// # Example
///
/// ```toml
/// [generation]
/// provider = "anthropic"
/// genre = "mystery"
/// chapters = 12
/// fragments = 4
/// chapter_prompt = "Write chapter {chapter} as described in the outline."
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), default)]
pub struct GenerationConfig {
    /// Name of the provider that writes the book
    #[serde(default = "default_provider")]
    provider: String,
    /// Genre label used in prompts
    #[serde(default = "default_genre")]
    genre: String,
    /// Chapters to generate
    #[serde(default = "default_chapters")]
    #[getter(copy)]
    chapters: usize,
    /// Fragments per chapter, at least 1
    #[serde(default = "default_fragments")]
    #[getter(copy)]
    fragments: usize,
    /// Carry conversation memory across fragments
    #[serde(default = "default_use_memory")]
    #[getter(copy)]
    use_memory: bool,
    /// Prompt templates
    #[serde(flatten)]
    prompts: PromptTemplates,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            genre: default_genre(),
            chapters: default_chapters(),
            fragments: default_fragments(),
            use_memory: default_use_memory(),
            prompts: PromptTemplates::default(),
        }
    }
}

impl GenerationConfig {
    /// Creates a new builder.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }

    /// Reject settings that cannot produce a book.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for zero chapters or fragments or a
    /// blank provider name.
    pub fn validate(&self) -> FolioResult<()> {
        let problem = if self.fragments == 0 {
            Some("generation.fragments must be at least 1")
        } else if self.chapters == 0 {
            Some("generation.chapters must be at least 1")
        } else if self.provider.trim().is_empty() {
            Some("generation.provider must name a configured provider")
        } else {
            None
        };
        match problem {
            Some(message) => Err(GenerationError::new(GenerationErrorKind::InvalidConfiguration(
                message.to_string(),
            ))
            .into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_with_overrides() {
        let config: GenerationConfig = toml::from_str(
            r#"
            provider = "anthropic"
            fragments = 5
            chapter_prompt = "Write chapter {chapter}."
            "#,
        )
        .unwrap();
        assert_eq!(config.provider(), "anthropic");
        assert_eq!(config.fragments(), 5);
        assert_eq!(config.chapters(), 1);
        assert!(config.use_memory());
        assert_eq!(config.prompts().chapter_prompt(), "Write chapter {chapter}.");
        assert_eq!(
            config.prompts().corrective_prompt(),
            PromptTemplates::default().corrective_prompt()
        );
    }

    #[test]
    fn test_zero_fragments_rejected() {
        let config = GenerationConfig::builder().fragments(0usize).build().unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fragments"));
    }
}
