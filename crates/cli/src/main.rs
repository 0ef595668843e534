//! CCNA Coach CLI
//!
//! Main entry point for the ccna-coach binary.
//! Seeds the question bank, builds the semantic index and serves the API.

mod commands;

use clap::{Parser, Subcommand};
use ccna_core::{config::AppConfig, logging, AppResult};
use commands::{IndexCommand, PopulateCommand, ServeCommand, StatsCommand};
use std::path::PathBuf;

/// CCNA Coach - practice questions and feedback for CCNA candidates
#[derive(Parser, Debug)]
#[command(name = "ccna-coach")]
#[command(about = "CCNA practice question retrieval and feedback service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CCNA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CCNA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (azure-openai, openai, ollama)
    #[arg(short, long, global = true, env = "CCNA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier (deployment name for Azure)
    #[arg(short, long, global = true, env = "CCNA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the search and feedback API
    Serve(ServeCommand),

    /// Load questions from a JSON seed file
    Populate(PopulateCommand),

    /// Embed stored questions into the semantic index
    Index(IndexCommand),

    /// Show question and index counts
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("CCNA Coach starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);

    config.ensure_ccna_dir()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Populate(_) => "populate",
        Commands::Index(_) => "index",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Populate(cmd) => cmd.execute(&config),
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
