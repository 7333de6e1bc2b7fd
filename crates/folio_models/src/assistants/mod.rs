//! OpenAI Assistants client with native thread memory and run polling.

mod client;
mod dto;

pub use client::AssistantsClient;
pub use dto::{
    CreateAssistant, CreateRun, CreateThread, MessageContent, MessageList, NewMessage, ObjectRef,
    Run, RunUsage, TextValue, ThreadMessage,
};
