//! Course Notes CLI
//!
//! Main entry point for the `notes` command-line tool.
//! Builds the course notes index, serves the query API and talks to it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IndexCommand, ServeCommand};
use notes_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Course Notes - question answering over a directory of notes
#[derive(Parser, Debug)]
#[command(name = "notes")]
#[command(about = "Question answering over course notes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NOTES_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Directory holding the course notes (default: <workspace>/data)
    #[arg(long, global = true, env = "NOTES_CORPUS_DIR")]
    corpus_dir: Option<PathBuf>,

    /// Directory holding the persisted index (default: <workspace>/storage)
    #[arg(long, global = true, env = "NOTES_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generative provider (gemini, ollama, mock)
    #[arg(short, long, global = true, env = "NOTES_PROVIDER")]
    provider: Option<String>,

    /// Generative model identifier
    #[arg(short, long, global = true, env = "NOTES_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Acquire the index and serve the HTTP query API
    Serve(ServeCommand),

    /// Build or load the index and print its statistics
    Index(IndexCommand),

    /// Answer one question in-process
    Ask(AskCommand),

    /// Interactive chat against a running server
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.corpus_dir,
        cli.storage_dir,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!(
        "Embeddings: {} ({})",
        config.embedding_provider,
        config.embedding_model
    );

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Index(_) => "index",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
