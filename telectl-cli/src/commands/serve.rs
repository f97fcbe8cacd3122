//! HTTP server command
//!
//! Runs the telectl API against PostgreSQL until Ctrl+C/SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use telectl_core::TelectlConfig;
use telectl_server::db::{create_pool_with_options, migrations};
use telectl_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: [server].bind in config, else 127.0.0.1:3040)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Apply schema migrations before serving
    #[arg(long)]
    pub migrate: bool,
}

/// Database URL from flag, environment or config file
pub fn resolve_database_url(flag: Option<String>, config: &TelectlConfig) -> Result<String> {
    flag.or_else(|| config.database.url.clone()).context(
        "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or [database].url in ~/.telectl/config.toml",
    )
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = TelectlConfig::load();
    let database_url = resolve_database_url(args.database_url, &config)?;

    let mut server_config = ServerConfig::from(&config.server);
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    server_config.cors_permissive |= args.cors_permissive;

    tracing::info!("Starting telectl server on {}", server_config.bind_addr);

    let pool = create_pool_with_options(&database_url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.migrate {
        migrations::run(&pool).await.context("Migrations failed")?;
    }

    // Blocks until shutdown
    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
