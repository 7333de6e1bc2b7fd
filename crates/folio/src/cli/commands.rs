//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Folio - fragment-by-fragment novel generation with multi-provider proofreading
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Generate a book from an outline and proofread it with several providers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file, layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a book from an outline
    Generate(GenerateArgs),

    /// Proofread an existing text file
    Proofread(ProofreadArgs),

    /// Load and validate the configuration, then report what would be used
    CheckConfig,
}

/// Who answers the revision questions
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecisionMode {
    /// Numbered menus on the terminal
    #[default]
    Interactive,
    /// Each pattern's configured action
    Policy,
}

/// Arguments for `folio generate`
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Outline text, or a path to a file holding it
    #[arg(long)]
    pub outline: String,

    /// Writing instructions, or a path to a file holding them
    #[arg(long)]
    pub instructions: Option<String>,

    /// Genre used in prompts
    #[arg(long)]
    pub genre: Option<String>,

    /// Number of chapters to write
    #[arg(long)]
    pub chapters: Option<usize>,

    /// Fragments per chapter
    #[arg(long)]
    pub fragments: Option<usize>,

    /// Provider that writes the book
    #[arg(long)]
    pub provider: Option<String>,

    /// Send every fragment prompt without conversation memory
    #[arg(long)]
    pub no_memory: bool,

    /// Markdown file to write
    #[arg(long)]
    pub output: PathBuf,

    /// Proofread the chapters before writing them
    #[arg(long)]
    pub proofread: bool,

    /// Decision source for the proofreading pass
    #[arg(long, value_enum, default_value_t = DecisionMode::Interactive)]
    pub decisions: DecisionMode,

    /// Also write the run summary as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

/// Arguments for `folio proofread`
#[derive(Args, Debug)]
pub struct ProofreadArgs {
    /// Text file to proofread as a single chapter
    #[arg(long)]
    pub input: PathBuf,

    /// Scanning providers, overriding `proofread.providers`
    #[arg(long, value_delimiter = ',')]
    pub providers: Option<Vec<String>>,

    /// Decision source for the revision
    #[arg(long, value_enum, default_value_t = DecisionMode::Interactive)]
    pub decisions: DecisionMode,

    /// Where to write the revised text (defaults to the input file)
    #[arg(long)]
    pub output: Option<PathBuf>,
}
