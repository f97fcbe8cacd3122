use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use telectl_core::TelectlConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Show the effective config (file + environment) as TOML
    Show,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", TelectlConfig::config_path().display());
            Ok(())
        }
        ConfigCommands::Show => run_show(),
    }
}

fn run_show() -> Result<()> {
    let mut config = TelectlConfig::load();
    config.database.url = config.database.url.as_deref().map(redact_password);

    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}

/// Hide the password part of a connection URL
fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}
