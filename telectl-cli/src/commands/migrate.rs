//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use telectl_core::TelectlConfig;
use telectl_server::db::{create_pool, migrations};

use super::serve::resolve_database_url;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = TelectlConfig::load();
    let database_url = resolve_database_url(args.database_url, &config)?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool).await.context("Migrations failed")?;

    println!("Schema is up to date");
    Ok(())
}
