//! Apply a raw SQL migration file to the configured database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use filestore_server::db::create_pool;
use filestore_server::db::migrate::apply_file;
use filestore_server::AppConfig;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Path to the SQL migration file
    #[arg(long, short = 'm', value_name = "PATH")]
    pub migration: PathBuf,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, mut config: AppConfig) -> Result<()> {
    if let Some(url) = args.database_url {
        config.postgres.url = Some(url);
    }

    let pool = create_pool(&config.postgres)
        .await
        .context("Failed to create database pool")?;

    apply_file(&pool, &args.migration)
        .await
        .with_context(|| format!("Failed to apply {}", args.migration.display()))?;

    pool.close().await;
    Ok(())
}
