//! Pipeline commands - talk to the telectl API
//!
//! ```bash
//! telectl pipelines create --file nginx.json
//! telectl pipelines version 3 --output json | jq '.pipelines[].alias'
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use telectl_core::{Pipeline, PostablePipeline, TelectlConfig};

use super::client::{
    build_client, expect_empty, handle_response, join_url, print_json, read_json_file, wire_name,
    OutputFormat,
};

#[derive(Parser, Debug)]
pub struct PipelinesArgs {
    /// telectl API endpoint (default: [client].endpoint in config)
    #[arg(long, env = "TELECTL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: PipelineCommands,
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommands {
    /// Create a pipeline from a JSON file (`-` reads stdin)
    Create {
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Show one pipeline
    Get { id: String },
    /// Delete a pipeline
    Delete { id: String },
    /// List the pipelines of an agent config version
    Version {
        #[arg(value_name = "VERSION")]
        number: i32,
    },
}

#[derive(Deserialize, serde::Serialize, Debug)]
struct PipelineListResponse {
    pipelines: Vec<Pipeline>,
    #[serde(default)]
    errors: Vec<String>,
}

pub async fn run_pipelines(args: PipelinesArgs) -> Result<()> {
    let endpoint = args
        .endpoint
        .unwrap_or_else(|| TelectlConfig::load().client.endpoint);
    let client = build_client()?;
    let base = join_url(&endpoint, "/api/v1/pipelines");

    match args.command {
        PipelineCommands::Create { file } => {
            let postable: PostablePipeline = read_json_file(&file)?;
            // Fail locally with the same message the server would send
            postable.validate()?;
            let response = client.post(&base).json(&postable).send().await?;
            let pipeline: Pipeline = handle_response(response).await?;
            print_pipeline(&pipeline, args.output)
        }
        PipelineCommands::Get { id } => {
            let response = client.get(format!("{}/{}", base, id)).send().await?;
            let pipeline: Pipeline = handle_response(response).await?;
            print_pipeline(&pipeline, args.output)
        }
        PipelineCommands::Delete { id } => {
            let response = client.delete(format!("{}/{}", base, id)).send().await?;
            expect_empty(response).await?;
            println!("Deleted pipeline {}", id);
            Ok(())
        }
        PipelineCommands::Version { number } => {
            let response = client
                .get(format!("{}/version/{}", base, number))
                .send()
                .await?;
            let listing: PipelineListResponse = handle_response(response).await?;
            match args.output {
                OutputFormat::Json => print_json(&listing),
                OutputFormat::Human => {
                    for pipeline in &listing.pipelines {
                        println!(
                            "{:>3}  {:<24} {:<10} {}",
                            pipeline.order_id,
                            pipeline.alias,
                            wire_name(&pipeline.deploy_status),
                            pipeline.id
                        );
                    }
                    for error in &listing.errors {
                        eprintln!("warning: {}", error);
                    }
                    Ok(())
                }
            }
        }
    }
}

fn print_pipeline(pipeline: &Pipeline, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(pipeline),
        OutputFormat::Human => {
            println!("{} ({})", pipeline.name, pipeline.alias);
            println!("  id:         {}", pipeline.id);
            println!("  order:      {}", pipeline.order_id);
            println!("  enabled:    {}", pipeline.enabled);
            println!("  filter:     {}", pipeline.filter);
            println!("  operators:  {}", pipeline.config.len());
            println!(
                "  deployment: {} (sequence {})",
                wire_name(&pipeline.deploy_status),
                pipeline.deploy_sequence
            );
            Ok(())
        }
    }
}
