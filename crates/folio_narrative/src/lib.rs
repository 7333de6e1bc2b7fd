//! Fragment-by-fragment narrative generation.
//!
//! A chapter is written by a [`FragmentOrchestrator`] that calls one
//! provider a fixed number of times, carrying conversation in a
//! [`MemoryContext`] and normalizing every reply with a [`ResponseParser`]
//! and its [`RuleChain`]. [`write_book`] repeats that per chapter, threading
//! a [`RunContext`] through the run.
//!
//! ```rust,ignore
//! use folio_narrative::{GenerationConfig, ResponseParser, RuleChain, RunContext, write_book};
//!
//! let parser = ResponseParser::new(RuleChain::standard());
//! let run = write_book(provider.as_ref(), RunContext::new(book), &config, &parser).await?;
//! println!("{}", run.book.to_markdown());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod driver;
mod memory;
mod orchestrator;
mod parser;
mod prompts;
mod rules;

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use driver::{RunContext, write_book};
pub use memory::MemoryContext;
pub use orchestrator::{ChapterPhase, FragmentOrchestrator};
pub use parser::{ResponseParser, split_summary};
pub use prompts::{FramedPrompt, PromptTemplates, PromptVars, render};
pub use rules::{CHAPTER_TITLE_PATTERN, Rule, RuleChain, RuleSpec, RuleState, StatefulAction};
