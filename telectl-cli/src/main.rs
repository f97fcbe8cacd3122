//! telectl CLI - log pipeline and ingestion rule management
//!
//! This is the main entry point for the telectl command-line tool, which provides:
//! - The HTTP API server and schema migrations (with `server` feature)
//! - Pipeline and ingestion rule commands against a running server
//! - Attribute-key autocomplete against the query service
//! - Config inspection and shell completions

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "telectl",
    author,
    version,
    about = "Manage log pipelines and ingestion rules",
    long_about = "Store log-processing pipelines and drop/sampling ingestion rules in PostgreSQL, \
                  serve them over HTTP, and track their deployment to agents."
)]
struct Cli {
    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    #[cfg(feature = "server")]
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    #[cfg(feature = "server")]
    Migrate(commands::migrate::MigrateArgs),
    /// Manage log pipelines (create, get, delete, version)
    Pipelines(commands::pipelines::PipelinesArgs),
    /// Manage drop and sampling rules (create, get, edit, delete, list, deploy, outcome)
    Rules(commands::rules::RulesArgs),
    /// Query the query service for attribute keys
    Attributes(commands::attributes::AttributesArgs),
    /// Inspect telectl configuration (path, show)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env files feed clap's `env` fallbacks, so load them before parsing
    telectl_core::config::load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = run(cli.command).await;
    tracing_setup::shutdown_otel();
    result
}

async fn run(command: Commands) -> Result<()> {
    match command {
        #[cfg(feature = "server")]
        Commands::Serve(args) => commands::run_serve(args).await,
        #[cfg(feature = "server")]
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Pipelines(args) => commands::run_pipelines(args).await,
        Commands::Rules(args) => commands::run_rules(args).await,
        Commands::Attributes(args) => commands::run_attributes(args).await,
        Commands::Config(args) => config::run_config(args),
        Commands::Completions(args) => run_completions(args),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rule_list_parses_type_and_status() {
        let cli = Cli::try_parse_from([
            "telectl", "rules", "list", "--type", "drop", "--status", "failed",
        ])
        .unwrap();
        let Commands::Rules(args) = cli.command else {
            panic!("expected rules command");
        };
        assert!(matches!(
            args.command,
            commands::rules::RuleCommands::List {
                rule_type: telectl_core::IngestionRuleType::Drop,
                status: Some(telectl_core::DeployStatus::Failed),
            }
        ));
    }

    #[test]
    fn unknown_rule_type_rejected() {
        let result = Cli::try_parse_from(["telectl", "rules", "list", "--type", "retain"]);
        assert!(result.is_err());
    }
}
