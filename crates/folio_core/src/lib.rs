//! Core data types for the Folio narrative engine.
//!
//! This crate holds the plain data shared by generation, scanning and revision:
//! books and their chapters, provider sessions, scan findings, revision
//! decisions and run metrics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod decision;
mod finding;
mod metrics;
mod session;

pub use book::{Book, BookBuilder, BookBuilderError, Chapter, Fragment, count_words};
pub use decision::{
    ChangeSpec, DecisionRequest, DecisionScope, RevisionDecision, RevisionOperation,
    RewriteProposal, RewriteVerdict,
};
pub use finding::{Match, MatchGroup, RawFinding, RawMatch};
pub use metrics::{ChapterMetrics, RunMetrics, RunSummary};
pub use session::{JobStatus, MemoryHandle, ProviderSession};
