//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the folio binary.

mod check;
mod commands;
mod generate;
mod proofread;

pub use check::run_check_config;
pub use commands::{Cli, Commands, DecisionMode, GenerateArgs, ProofreadArgs};
pub use generate::run_generate;
pub use proofread::{proofread_book, run_proofread};
