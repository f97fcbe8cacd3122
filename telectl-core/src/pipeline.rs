//! Log pipelines
//!
//! A pipeline is an ordered list of operators applied to logs matching its
//! filter. The operator list is stored as a JSON column; [`Pipeline`] keeps
//! both the parsed list and the raw text it came from.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::deploy::{DeployStatus, SEQ_NEVER_DEPLOYED};
use crate::error::{CoreError, Result};
use crate::validation::require_text;
use crate::ValidationError;

const MAX_NAME_LEN: usize = 128;
const MAX_ALIAS_LEN: usize = 64;
const MAX_FILTER_LEN: usize = 2048;

/// Alias slug: lowercase alphanumeric, hyphens/underscores, alphanumeric first
static ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("invalid alias regex")
});

fn default_true() -> bool {
    true
}

/// One processing step inside a pipeline.
///
/// Operator-specific parameters (parse_from, regex, field, ...) are kept in
/// `params` untouched so nothing is lost when the config is re-serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOperator {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Pipeline as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostablePipeline {
    pub order_id: i32,
    #[serde(default)]
    pub enabled: bool,
    pub name: String,
    pub alias: String,
    pub filter: String,
    #[serde(default)]
    pub config: Vec<PipelineOperator>,
}

impl PostablePipeline {
    /// Check the pipeline before anything is written.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.order_id < 1 {
            return Err(ValidationError::OutOfRange {
                field: "orderId",
                min: 1,
                max: i32::MAX as i64,
            });
        }

        require_text("name", &self.name, MAX_NAME_LEN)?;

        if self.alias.is_empty() {
            return Err(ValidationError::Empty { field: "alias" });
        }
        if self.alias.len() > MAX_ALIAS_LEN {
            return Err(ValidationError::TooLong {
                field: "alias",
                max: MAX_ALIAS_LEN,
            });
        }
        if !ALIAS_RE.is_match(&self.alias) {
            return Err(ValidationError::InvalidFormat {
                field: "alias",
                reason: "must be lowercase alphanumeric with hyphens/underscores, starting with alphanumeric",
            });
        }

        require_text("filter", &self.filter, MAX_FILTER_LEN)?;

        let mut seen = HashSet::new();
        for op in &self.config {
            if op.id.trim().is_empty() {
                return Err(ValidationError::Empty { field: "operator id" });
            }
            if op.kind.trim().is_empty() {
                return Err(ValidationError::Empty { field: "operator type" });
            }
            if !seen.insert(op.id.as_str()) {
                return Err(ValidationError::InvalidFormat {
                    field: "config",
                    reason: "operator ids must be unique within a pipeline",
                });
            }
        }

        Ok(())
    }

    /// Validate, assign a fresh id and serialize the operator list.
    ///
    /// The returned pipeline is what gets inserted: status pending, never
    /// deployed, `raw_config` holding exactly the serialization of `config`.
    pub fn into_pipeline(self) -> Result<Pipeline> {
        self.validate()?;

        let raw_config = serde_json::to_string(&self.config)
            .map_err(|e| CoreError::json("pipeline config", e))?;

        Ok(Pipeline {
            id: crate::new_id(),
            order_id: self.order_id,
            enabled: self.enabled,
            name: self.name,
            alias: self.alias,
            filter: self.filter,
            config: self.config,
            raw_config,
            deploy_status: DeployStatus::Pending,
            deploy_sequence: SEQ_NEVER_DEPLOYED,
        })
    }
}

/// Stored pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    pub order_id: i32,
    pub enabled: bool,
    pub name: String,
    pub alias: String,
    pub filter: String,
    pub config: Vec<PipelineOperator>,
    #[serde(skip)]
    pub raw_config: String,
    pub deploy_status: DeployStatus,
    pub deploy_sequence: i32,
}

/// Parse a stored `config_json` column into operators.
pub fn parse_operators(raw: &str) -> std::result::Result<Vec<PipelineOperator>, serde_json::Error> {
    serde_json::from_str(raw)
}
