//! Google Gemini REST client with per-chapter context caching.

mod client;
mod dto;

pub use client::{DEFAULT_CACHE_TTL, GEMINI_BASE_URL, GeminiClient};
pub use dto::{
    CachedContent, Candidate, Content, CreateCachedContent, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part, UsageMetadata,
};
