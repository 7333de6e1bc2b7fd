//! Anthropic Messages API client.
//!
//! Anthropic has no server-side conversation state, so memory is the
//! session transcript. Reference material travels as the system prompt.

mod client;
mod dto;

pub use client::{ANTHROPIC_BASE_URL, AnthropicClient};
pub use dto::{
    AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicRequestBuilder,
    AnthropicResponse, AnthropicUsage, DEFAULT_MAX_TOKENS,
};
pub(crate) use dto::to_messages;
