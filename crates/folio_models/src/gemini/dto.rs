//! Data transfer objects for the Gemini REST API.

use crate::conversation::{Conversation, Speaker};
use serde::{Deserialize, Serialize};

/// A text part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Text of the part
    #[serde(default)]
    pub text: String,
}

/// A content entry: a role and its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"; absent for system instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts of the content
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Content with a role and a single text part.
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation contents
    pub contents: Vec<Content>,
    /// System instruction, omitted when a cache holds it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Name of a cached content resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
    /// Sampling configuration
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Build a request from a conversation.
    pub(crate) fn from_conversation(
        conversation: &Conversation,
        cached_content: Option<String>,
        generation_config: GenerationConfig,
    ) -> Self {
        let contents = conversation
            .turns
            .iter()
            .map(|turn| {
                let role = match turn.speaker {
                    Speaker::User => "user",
                    Speaker::Assistant => "model",
                };
                Content::text(Some(role), turn.text.clone())
            })
            .collect();

        Self {
            contents,
            system_instruction: conversation
                .system
                .as_ref()
                .map(|system| Content::text(None, system.clone())),
            cached_content,
            generation_config,
        }
    }
}

/// One response candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt tokens, including cached ones
    #[serde(default)]
    pub prompt_token_count: u64,
    /// Generated tokens
    #[serde(default)]
    pub candidates_token_count: u64,
    /// Prompt tokens served from the cache
    #[serde(default)]
    pub cached_content_token_count: u64,
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates, usually one
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token usage
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, empty when absent.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Request body for `POST cachedContents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCachedContent {
    /// Fully qualified model, e.g. "models/gemini-1.5-flash-001"
    pub model: String,
    /// Reference material held by the cache
    pub system_instruction: Content,
    /// Time to live, e.g. "3600s"
    pub ttl: String,
}

/// A cached content resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedContent {
    /// Resource name, e.g. "cachedContents/abc123"
    pub name: String,
    /// RFC 3339 expiry
    #[serde(default)]
    pub expire_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{MemoryHandle, ProviderSession};

    #[test]
    fn test_cached_request_omits_system_instruction() {
        let mut session = ProviderSession::new(
            "gemini",
            MemoryHandle::Cache {
                name: "cachedContents/abc".into(),
            },
            "Outline:\nX",
        );
        session.append_transcript("[Fragment 1]\nIt began.\n\n");
        let conversation = Conversation::from_session("Continue.", &session).without_system();
        let request = GenerateContentRequest::from_conversation(
            &conversation,
            Some("cachedContents/abc".into()),
            GenerationConfig::default(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["cachedContent"], "cachedContents/abc");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_response_text_and_usage() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "A"}, {"text": "B"}]},
                "finishReason": "STOP"}],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "AB");
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 12);
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(response.text(), "");
    }
}
