//! DocQA CLI
//!
//! Main entry point for the docqa command-line tool.
//! Chunks, indexes and answers questions over local documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChunkCommand, DeleteCommand, IngestCommand};
use docqa_core::logging::{self, LogFormat};
use docqa_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// DocQA - document chunking, vector retrieval and extractive answers
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Document chunking, vector retrieval and extractive answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
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

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a document into passages
    Chunk(ChunkCommand),

    /// Chunk, embed and index documents
    Ingest(IngestCommand),

    /// Answer a question from an indexed document
    Ask(AskCommand),

    /// Delete an indexed document collection
    Delete(DeleteCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;
    let loaded_file = config.config_file.clone();

    // Apply CLI overrides
    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.json_logs,
    );

    // A config file named only on the command line is merged last
    if let Some(path) = config.config_file.clone() {
        if loaded_file.as_ref() != Some(&path) {
            config = config.merge_yaml(&path)?;
            config.validate()?;
        }
    }

    let format = if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    tracing::info!("DocQA CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {} ({}), vector backend: {:?}",
        config.embedding.provider,
        config.embedding.model,
        config.vector_store.backend
    );

    let command_name = match &cli.command {
        Commands::Chunk(_) => "chunk",
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::Delete(_) => "delete",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Chunk(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Delete(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
