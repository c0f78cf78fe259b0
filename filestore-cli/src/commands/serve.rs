//! HTTP server command
//!
//! Connects to PostgreSQL, then serves the file endpoints until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use filestore_server::admission::AdmissionLimits;
use filestore_server::db::create_pool;
use filestore_server::http::{run_server, ServerConfig};
use filestore_server::{AppConfig, FileService, PgFileRepository};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides listen.host/listen.port)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    if let Some(url) = args.database_url {
        config.postgres.url = Some(url);
    }

    let mut server_config =
        ServerConfig::from_app_config(&config).context("Invalid listen address")?;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    server_config.cors_permissive |= args.cors_permissive;

    // Admitted calls queue inside sqlx when the pool is smaller than a class.
    let slots = AdmissionLimits::DEFAULT.read.max(AdmissionLimits::DEFAULT.create);
    if (config.postgres.max_connections as usize) < slots {
        tracing::warn!(
            max_connections = config.postgres.max_connections,
            "pool is smaller than the admission capacity of {}",
            slots
        );
    }

    tracing::info!("Starting filestore server on {}", server_config.bind_addr);

    let pool = create_pool(&config.postgres)
        .await
        .context("Failed to create database pool")?;

    let repo = Arc::new(PgFileRepository::new(pool));
    let service = FileService::new(repo, &config.server);

    // Run server (blocks until shutdown)
    run_server(service, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
