//! Attribute-key autocomplete against the query service
//!
//! ```bash
//! telectl attributes keys --search service --data-source traces
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use telectl_core::attributes::ATTRIBUTE_KEYS_PATH;
use telectl_core::{
    AggregateOperator, AttributeKeysQuery, AttributeKeysResponse, DataSource, TelectlConfig,
};

use super::client::{build_client, handle_response, join_url, print_json, wire_name, OutputFormat};

#[derive(Parser, Debug)]
pub struct AttributesArgs {
    /// Query service endpoint (default: [client].query_service_endpoint in config)
    #[arg(long, env = "TELECTL_QUERY_SERVICE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: AttributeCommands,
}

#[derive(Subcommand, Debug)]
pub enum AttributeCommands {
    /// Suggest attribute keys matching a search text
    Keys(KeysArgs),
}

#[derive(Parser, Debug)]
pub struct KeysArgs {
    /// Text the key should contain
    #[arg(long, short, default_value = "")]
    pub search: String,

    /// Aggregate operator the key will be used with
    #[arg(long, default_value = "noop")]
    pub operator: AggregateOperator,

    /// Signal to search: traces, metrics or logs
    #[arg(long, short, default_value = "logs")]
    pub data_source: DataSource,

    /// Attribute being aggregated, if any
    #[arg(long, short, default_value = "")]
    pub attribute: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

impl From<&KeysArgs> for AttributeKeysQuery {
    fn from(args: &KeysArgs) -> Self {
        Self {
            search_text: args.search.clone(),
            aggregate_operator: args.operator,
            data_source: args.data_source,
            aggregate_attribute: args.attribute.clone(),
        }
    }
}

/// Fetch attribute-key suggestions from the query service.
pub async fn fetch_attribute_keys(
    client: &Client,
    endpoint: &str,
    query: &AttributeKeysQuery,
) -> Result<AttributeKeysResponse> {
    let url = join_url(endpoint, ATTRIBUTE_KEYS_PATH);
    tracing::debug!(%url, search = %query.search_text, "fetching attribute keys");

    let response = client
        .get(&url)
        .query(&query.to_query_pairs())
        .send()
        .await
        .with_context(|| format!("Failed to reach query service at {}", endpoint))?;

    handle_response(response).await
}

pub async fn run_attributes(args: AttributesArgs) -> Result<()> {
    let endpoint = args
        .endpoint
        .unwrap_or_else(|| TelectlConfig::load().client.query_service_endpoint);
    let client = build_client()?;

    match args.command {
        AttributeCommands::Keys(keys) => {
            let query = AttributeKeysQuery::from(&keys);
            let found = fetch_attribute_keys(&client, &endpoint, &query).await?;

            match keys.output {
                OutputFormat::Json => print_json(&found),
                OutputFormat::Human => {
                    if found.attribute_keys.is_empty() {
                        println!("No attribute keys match '{}'", query.search_text);
                    }
                    for key in &found.attribute_keys {
                        println!(
                            "{:<40} {:<8} {:<9}{}",
                            key.key,
                            wire_name(&key.data_type),
                            wire_name(&key.kind),
                            if key.is_column { " column" } else { "" }
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_to_query() {
        let args = KeysArgs {
            search: "http.".into(),
            operator: AggregateOperator::Count,
            data_source: DataSource::Traces,
            attribute: String::new(),
            output: OutputFormat::Human,
        };
        let query = AttributeKeysQuery::from(&args);
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("searchText", "http.".to_string())));
        assert!(pairs.contains(&("dataSource", "traces".to_string())));
        assert!(pairs.contains(&("aggregateOperator", "count".to_string())));
    }

    #[tokio::test]
    async fn fetches_typed_keys() {
        use mockito::Matcher;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", ATTRIBUTE_KEYS_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("searchText".into(), "http".into()),
                Matcher::UrlEncoded("dataSource".into(), "logs".into()),
                Matcher::UrlEncoded("aggregateOperator".into(), "noop".into()),
                Matcher::UrlEncoded("aggregateAttribute".into(), "".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"attributeKeys":[
                    {"key":"http.method","dataType":"string","type":"tag","isColumn":true},
                    {"key":"http.status_code","dataType":"int64","type":"tag","isColumn":false}
                ]}"#,
            )
            .create_async()
            .await;

        let query = AttributeKeysQuery {
            search_text: "http".into(),
            aggregate_operator: AggregateOperator::Noop,
            data_source: DataSource::Logs,
            aggregate_attribute: String::new(),
        };
        let client = build_client().unwrap();
        let found = fetch_attribute_keys(&client, &server.url(), &query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(found.attribute_keys.len(), 2);
        assert_eq!(found.attribute_keys[0].key, "http.method");
        assert!(found.attribute_keys[0].is_column);
    }

    #[tokio::test]
    async fn query_service_error_surfaces() {
        use mockito::Matcher;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ATTRIBUTE_KEYS_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let query = AttributeKeysQuery {
            search_text: String::new(),
            aggregate_operator: AggregateOperator::Noop,
            data_source: DataSource::Metrics,
            aggregate_attribute: String::new(),
        };
        let client = build_client().unwrap();
        let err = fetch_attribute_keys(&client, &server.url(), &query)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
