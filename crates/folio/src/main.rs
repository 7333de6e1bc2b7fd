//! Folio CLI binary.
//!
//! This binary provides command-line access to Folio's functionality:
//! - Generate a book from an outline, fragment by fragment
//! - Proofread chapters with several providers
//! - Check the layered configuration

use clap::Parser;
use folio::{FolioConfig, ObservabilityConfig};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_check_config, run_generate, run_proofread};

    // API keys may live in a .env file
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut logging = ObservabilityConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }

    #[cfg(feature = "observability")]
    let guard = folio::init_observability(&logging)?;
    #[cfg(not(feature = "observability"))]
    folio::init_logging(&logging)?;

    let config = FolioConfig::load(cli.config.as_deref())?;

    // Execute the requested command
    let result = match cli.command {
        Commands::Generate(args) => run_generate(config, args).await,
        Commands::Proofread(args) => run_proofread(config, args).await,
        Commands::CheckConfig => run_check_config(&config),
    };

    #[cfg(feature = "observability")]
    guard.shutdown();

    result?;
    Ok(())
}
