//! Ingestion rule commands - talk to the telectl API

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use telectl_core::{
    DeployStatus, IngestionRule, IngestionRuleType, PostableIngestionRule, RuleEdit,
    TelectlConfig,
};

use super::client::{
    build_client, expect_empty, handle_response, join_url, print_json, read_json_file, wire_name,
    OutputFormat,
};

#[derive(Parser, Debug)]
pub struct RulesArgs {
    /// telectl API endpoint (default: [client].endpoint in config)
    #[arg(long, env = "TELECTL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: RuleCommands,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// Create a rule from a JSON file (`-` reads stdin)
    Create {
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Show one rule
    Get { id: String },
    /// Replace a rule's editable fields from a JSON file; queues a redeploy
    Edit {
        id: String,
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Delete a rule
    Delete { id: String },
    /// List rules of one type
    List {
        /// Rule type: drop or sampling
        #[arg(long = "type", short = 't')]
        rule_type: IngestionRuleType,
        /// Only rules in this deployment status
        #[arg(long, short)]
        status: Option<DeployStatus>,
    },
    /// Mark every rule of a type as deploying under a sequence
    Deploy {
        #[arg(long = "type", short = 't')]
        rule_type: IngestionRuleType,
        #[arg(long)]
        sequence: i32,
    },
    /// Record the outcome of a deployment
    Outcome {
        sequence: i32,
        /// DEPLOYED or FAILED
        #[arg(long, short)]
        status: DeployStatus,
        /// Error reported by the agent
        #[arg(long)]
        error: Option<String>,
    },
}

#[derive(Deserialize, Serialize, Debug)]
struct RuleListResponse {
    rules: Vec<IngestionRule>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug)]
struct UpdatedResponse {
    updated: u64,
}

/// Listing path for a rule type
fn list_path(rule_type: IngestionRuleType) -> &'static str {
    match rule_type {
        IngestionRuleType::Drop => "/api/v1/drop_rules",
        IngestionRuleType::Sampling => "/api/v1/sampling_rules",
    }
}

pub async fn run_rules(args: RulesArgs) -> Result<()> {
    let endpoint = args
        .endpoint
        .unwrap_or_else(|| TelectlConfig::load().client.endpoint);
    let client = build_client()?;
    let base = join_url(&endpoint, "/api/v1/ingestion_rules");

    match args.command {
        RuleCommands::Create { file } => {
            let postable: PostableIngestionRule = read_json_file(&file)?;
            postable.validate()?;
            let response = client.post(&base).json(&postable).send().await?;
            let rule: IngestionRule = handle_response(response).await?;
            print_rule(&rule, args.output)
        }
        RuleCommands::Get { id } => {
            let response = client.get(format!("{}/{}", base, id)).send().await?;
            let rule: IngestionRule = handle_response(response).await?;
            print_rule(&rule, args.output)
        }
        RuleCommands::Edit { id, file } => {
            let edit: RuleEdit = read_json_file(&file)?;
            edit.clone().prepare()?;
            let response = client.put(format!("{}/{}", base, id)).json(&edit).send().await?;
            let rule: IngestionRule = handle_response(response).await?;
            print_rule(&rule, args.output)
        }
        RuleCommands::Delete { id } => {
            let response = client.delete(format!("{}/{}", base, id)).send().await?;
            expect_empty(response).await?;
            println!("Deleted rule {}", id);
            Ok(())
        }
        RuleCommands::List { rule_type, status } => {
            let mut request = client.get(join_url(&endpoint, list_path(rule_type)));
            if let Some(status) = status {
                request = request.query(&[("status", status.as_str())]);
            }
            let listing: RuleListResponse = handle_response(request.send().await?).await?;
            match args.output {
                OutputFormat::Json => print_json(&listing),
                OutputFormat::Human => {
                    for rule in &listing.rules {
                        println!(
                            "{:>3}  {:<28} {:<8} {:<10} {}",
                            rule.priority,
                            rule.name,
                            rule.source.as_str(),
                            wire_name(&rule.deploy_status),
                            rule.id
                        );
                    }
                    for error in &listing.errors {
                        eprintln!("warning: {}", error);
                    }
                    Ok(())
                }
            }
        }
        RuleCommands::Deploy { rule_type, sequence } => {
            let response = client
                .post(format!("{}/deploy", base))
                .json(&json!({ "ruleType": rule_type, "sequence": sequence }))
                .send()
                .await?;
            let updated: UpdatedResponse = handle_response(response).await?;
            print_updated(&updated, args.output)
        }
        RuleCommands::Outcome {
            sequence,
            status,
            error,
        } => {
            let response = client
                .post(format!("{}/deploy/{}/status", base, sequence))
                .json(&json!({ "status": status, "errorMessage": error }))
                .send()
                .await?;
            let updated: UpdatedResponse = handle_response(response).await?;
            print_updated(&updated, args.output)
        }
    }
}

fn print_updated(updated: &UpdatedResponse, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(updated),
        OutputFormat::Human => {
            println!("{} rule(s) updated", updated.updated);
            Ok(())
        }
    }
}

fn print_rule(rule: &IngestionRule, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(rule),
        OutputFormat::Human => {
            println!("{}", rule.name);
            println!("  id:         {}", rule.id);
            println!("  type:       {} ({})", rule.rule_type, rule.source.as_str());
            println!("  priority:   {}", rule.priority);
            println!(
                "  deployment: {} (sequence {})",
                wire_name(&rule.deploy_status),
                rule.deploy_sequence
            );
            if let Some(ref message) = rule.error_message {
                println!("  error:      {}", message);
            }
            println!("  updated:    {}", rule.updated_at.to_rfc3339());
            Ok(())
        }
    }
}
