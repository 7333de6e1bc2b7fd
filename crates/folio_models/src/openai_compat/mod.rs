//! OpenAI-compatible chat completion provider.

mod client;
mod dto;

pub use client::{OPENAI_BASE_URL, OpenAICompatibleClient};
pub use dto::{ChatChoice, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, ChatUsage};
pub(crate) use dto::to_messages;
