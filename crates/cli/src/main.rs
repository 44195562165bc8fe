//! vecbase CLI
//!
//! Command-line front end for the per-knowledge-base vector index manager.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    QueryCommand, RemoveDocCommand, RemoveFragmentCommand, RemoveKbCommand, SchemaCommand,
    StoreBackend, StoreCommand,
};
use std::path::PathBuf;
use vecbase_core::{config::AppConfig, logging, AppResult};

/// vecbase - per-knowledge-base vector index manager
#[derive(Parser, Debug)]
#[command(name = "vecbase")]
#[command(
    about = "Embed, store, query and delete knowledge base chunks in a vector store",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "VECBASE_CONFIG")]
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

    /// Vector store backend; `memory` lives only for this process
    #[arg(long, global = true, value_enum, default_value_t = StoreBackend::Weaviate)]
    store: StoreBackend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ensure the class for a knowledge base exists
    Schema(SchemaCommand),

    /// Embed and store the chunks of a document
    Store(StoreCommand),

    /// Find the chunks closest to a query text
    Query(QueryCommand),

    /// Drop a knowledge base with all its records
    RemoveKb(RemoveKbCommand),

    /// Delete every record of a document
    RemoveDoc(RemoveDocCommand),

    /// Delete every record of a fragment
    RemoveFragment(RemoveFragmentCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from file and environment, then apply CLI overrides
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("vecbase CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Store backend: {:?}", cli.store);

    let command_name = match &cli.command {
        Commands::Schema(_) => "schema",
        Commands::Store(_) => "store",
        Commands::Query(_) => "query",
        Commands::RemoveKb(_) => "remove-kb",
        Commands::RemoveDoc(_) => "remove-doc",
        Commands::RemoveFragment(_) => "remove-fragment",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let backend = cli.store;
    let service = commands::open_service(&config, backend)?;

    let result = match cli.command {
        Commands::Schema(cmd) => cmd.execute(&service).await,
        Commands::Store(cmd) => cmd.execute(&service, &config).await,
        Commands::Query(cmd) => cmd.execute(&service, &config).await,
        Commands::RemoveKb(cmd) => cmd.execute(&service).await,
        Commands::RemoveDoc(cmd) => cmd.execute(&service).await,
        Commands::RemoveFragment(cmd) => cmd.execute(&service).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("{}", commands::failure_message(backend, e)),
    }

    result
}
