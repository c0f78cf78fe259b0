//! filestore CLI - file storage service
//!
//! Entry point for the `filestore` binary:
//! - `serve` runs the HTTP file service against PostgreSQL
//! - `migrate` applies a raw SQL migration file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filestore_server::AppConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "filestore",
    author,
    version,
    about = "File storage service with bounded per-operation concurrency",
    long_about = "Upload, download and list files stored in PostgreSQL. Uploads and downloads \
                  are limited to 10 concurrent calls each, listings to 100."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to the YAML config file (default: ./config.yaml when present)
    #[arg(long, short = 'c', global = true, env = "FILESTORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP file service
    Serve(commands::serve::ServeArgs),
    /// Apply a SQL migration file to the database
    Migrate(commands::migrate::MigrateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; explicit environment still applies.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug || config.is_debug,
    })
    .ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Migrate(args) => commands::run_migrate(args, config).await?,
    }
    Ok(())
}
