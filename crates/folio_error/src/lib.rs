//! Error types for the Folio workspace.
//!
//! This crate provides the error types shared by every Folio crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use folio_error::{FolioResult, HttpError};
//!
//! fn fetch_data() -> FolioResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod http;
mod io;
mod json;
mod provider;
mod revision;

pub use config::ConfigError;
pub use error::{FolioError, FolioErrorKind, FolioResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use http::HttpError;
pub use io::IoError;
pub use json::JsonError;
pub use provider::{ProviderError, ProviderErrorKind, RetryableError};
pub use revision::{RevisionError, RevisionErrorKind};
