//! Folio - fragment-by-fragment novel generation
//!
//! Folio writes a book chapter by chapter from an outline, asking a language
//! model provider for a fixed number of fragments per chapter while carrying
//! conversation memory between them. A second pass proofreads each chapter:
//! several providers scan the indexed sentences for configured patterns,
//! their findings are merged by consensus, and an operator (or a policy)
//! decides what to keep, delete, replace or rewrite.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use folio::{BookBuilder, FolioConfig, ResponseParser, RunContext, write_book};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FolioConfig::load(None)?;
//!     config.validate()?;
//!
//!     let provider = config.build_provider(config.generation.provider())?;
//!     let book = BookBuilder::default()
//!         .outline("A miner finds a cave that hums at night.")
//!         .genre(config.generation.genre().clone())
//!         .build()?;
//!
//!     let parser = ResponseParser::new(config.rule_chain()?);
//!     let run = write_book(provider.as_ref(), RunContext::new(book), &config.generation, &parser)
//!         .await?;
//!     println!("{}", run.metrics.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - Bridge tracing spans and provider metrics to OpenTelemetry
//! - `api` - Enable tests that call real provider APIs
//!
//! # Architecture
//!
//! Folio is organized as a workspace with focused crates:
//!
//! - `folio_error` - Error types
//! - `folio_core` - Book, findings, decisions and metrics
//! - `folio_interface` - `ProviderAdapter` and `DecisionSource` traits
//! - `folio_rate_limit` - Retry, pacing and polling
//! - `folio_models` - Provider adapters
//! - `folio_narrative` - Memory, response parsing and fragment orchestration
//! - `folio_proofread` - Scanning, merging and revision
//!
//! This crate (`folio`) re-exports everything for convenience and adds the
//! configuration, file and console plumbing used by the binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod console;
mod observability;
mod source;

pub use config::FolioConfig;
pub use console::ConsoleDecisionSource;
pub use observability::{ObservabilityConfig, init_logging};
#[cfg(feature = "observability")]
pub use observability::{ObservabilityGuard, init_observability};
pub use source::{load_source, write_markdown, write_summary, write_text};

// Re-export workspace crates
pub use folio_core::*;
pub use folio_error::*;
pub use folio_interface::*;
pub use folio_models::*;
pub use folio_narrative::*;
pub use folio_proofread::*;
pub use folio_rate_limit::*;
