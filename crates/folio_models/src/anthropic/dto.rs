//! Data transfer objects for the Anthropic Messages API.

use crate::conversation::{Conversation, Speaker};
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Default completion budget; the Messages API requires one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A single message in an Anthropic conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Plain text content
    pub content: String,
}

/// Request body for `POST /messages`.
#[derive(Debug, Clone, Serialize, Builder, Getters)]
#[builder(setter(into))]
pub struct AnthropicRequest {
    /// Model identifier
    model: String,
    /// Maximum tokens to generate
    max_tokens: u32,
    /// System prompt carrying the reference material
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Alternating user/assistant messages, starting with user
    messages: Vec<AnthropicMessage>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl AnthropicRequest {
    /// Creates a new builder for AnthropicRequest.
    pub fn builder() -> AnthropicRequestBuilder {
        AnthropicRequestBuilder::default()
    }
}

/// Convert conversation turns into Anthropic messages.
///
/// System text travels separately in [`AnthropicRequest::system`].
pub(crate) fn to_messages(conversation: &Conversation) -> Vec<AnthropicMessage> {
    conversation
        .turns
        .iter()
        .map(|turn| AnthropicMessage {
            role: match turn.speaker {
                Speaker::User => "user".to_string(),
                Speaker::Assistant => "assistant".to_string(),
            },
            content: turn.text.clone(),
        })
        .collect()
}

/// A content block in a response. Only text blocks carry text.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContentBlock {
    /// Block type, e.g. "text"
    #[serde(rename = "type")]
    pub kind: String,
    /// Text of a text block
    #[serde(default)]
    pub text: Option<String>,
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnthropicUsage {
    /// Input tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens
    #[serde(default)]
    pub output_tokens: u64,
}

/// Response body of `POST /messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
    /// Response identifier
    #[serde(default)]
    pub id: String,
    /// Content blocks
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
    /// Why generation stopped
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

impl AnthropicResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{MemoryHandle, ProviderSession};

    #[test]
    fn test_reference_goes_to_system_not_messages() {
        let session = ProviderSession::new("anthropic", MemoryHandle::Transcript, "Outline:\nX");
        let conversation = Conversation::from_session("Begin.", &session);
        let request = AnthropicRequest::builder()
            .model("claude-3-5-haiku-latest")
            .max_tokens(DEFAULT_MAX_TOKENS)
            .system(conversation.system.clone())
            .messages(to_messages(&conversation))
            .build()
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "Outline:\nX");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"id": "msg_1", "content": [
                {"type": "text", "text": "The cave "},
                {"type": "tool_use", "id": "t"},
                {"type": "text", "text": "was dark."}
            ], "usage": {"input_tokens": 10, "output_tokens": 4}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "The cave was dark.");
        assert_eq!(response.usage.unwrap().output_tokens, 4);
    }
}
