//! Data transfer objects for the OpenAI Assistants API (v2).

use folio_core::JobStatus;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Request body for `POST /assistants`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssistant {
    /// Model identifier
    pub model: String,
    /// Display name
    pub name: String,
    /// Standing instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message posted to a thread.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    /// Always "user" for messages we post
    pub role: String,
    /// Message text
    pub content: String,
}

impl NewMessage {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /threads`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateThread {
    /// Seed messages
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<NewMessage>,
}

/// Request body for `POST /threads/{id}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRun {
    /// Assistant that executes the run
    pub assistant_id: String,
    /// Completion token cap for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

/// Any object that only matters for its identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    /// Identifier
    pub id: String,
}

/// Token usage of a finished run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: u64,
}

/// A run and its status.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    /// Run identifier
    pub id: String,
    /// Raw status string
    pub status: String,
    /// Usage, present once the run is terminal
    #[serde(default)]
    pub usage: Option<RunUsage>,
}

impl Run {
    /// Parsed status; unknown strings map to [`JobStatus::Other`].
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_str(&self.status).unwrap_or(JobStatus::Other(self.status.clone()))
    }
}

/// Text payload of a text content block.
#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    /// The text
    pub value: String,
}

/// A content block of a thread message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    /// Block type, e.g. "text"
    #[serde(rename = "type")]
    pub kind: String,
    /// Present for text blocks
    #[serde(default)]
    pub text: Option<TextValue>,
}

/// A message read back from a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Content blocks
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.text.as_ref())
            .map(|text| text.value.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Page of thread messages.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    /// Messages in the requested order
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

impl MessageList {
    /// Text of the newest assistant message in a newest-first page.
    pub fn latest_assistant_text(&self) -> String {
        self.data
            .iter()
            .find(|message| message.role == "assistant")
            .map(ThreadMessage::text)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_parsing() {
        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "in_progress"}"#).unwrap();
        assert_eq!(run.job_status(), JobStatus::InProgress);
        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "expired"}"#).unwrap();
        assert!(run.job_status().is_terminal());
        assert!(!run.job_status().is_success());
    }

    #[test]
    fn test_latest_assistant_text() {
        let list: MessageList = serde_json::from_str(
            r#"{"data": [
                {"role": "assistant", "content": [{"type": "text", "text": {"value": "It was dark."}}]},
                {"role": "user", "content": [{"type": "text", "text": {"value": "Continue."}}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(list.latest_assistant_text(), "It was dark.");
    }
}
