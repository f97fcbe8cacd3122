//! HTTP client helpers shared by the API subcommands

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
}

/// Error body returned by the telectl API
#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Build the HTTP client used for every request
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("telectl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Join a base endpoint and an absolute path without doubling slashes
pub fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

/// Decode a success body, or turn an error body into a readable error.
pub async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response.json::<T>().await.context("Failed to parse response")
    } else {
        Err(error_from_body(status, &response_text(response).await))
    }
}

/// Like [`handle_response`] for endpoints that answer with no body.
pub async fn expect_empty(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_from_body(status, &response_text(response).await))
    }
}

async fn response_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

fn error_from_body(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error,
            message: Some(message),
        }) => anyhow!("{}: {} ({})", status, message, error),
        Ok(ErrorResponse { error, message: None }) => anyhow!("{}: {}", status, error),
        Err(_) => anyhow!("{}: {}", status, body),
    }
}

/// Read a JSON request body from a file, or stdin when the path is `-`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Lowercase wire name of a serializable enum value, for table output
pub fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "?".to_string(),
    }
}
