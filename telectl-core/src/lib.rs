//! telectl-core: domain types for log pipelines and ingestion rules
//!
//! Everything here is pure data and validation. Persistence lives in
//! telectl-server; the CLI only moves these types over HTTP.

pub mod attributes;
pub mod config;
pub mod deploy;
pub mod element;
pub mod error;
pub mod ingestion_rule;
pub mod pipeline;
pub mod validation;

pub use attributes::{AggregateOperator, AttributeKey, AttributeKeysQuery, AttributeKeysResponse, DataSource};
pub use config::TelectlConfig;
pub use deploy::{DeployStatus, SEQ_NEVER_DEPLOYED, SEQ_REDEPLOY_QUEUED};
pub use element::ElementType;
pub use error::{CoreError, Result};
pub use ingestion_rule::{
    IngestionRule, IngestionRuleType, IngestionSource, PostableIngestionRule, PreparedEdit,
    RuleConfig, RuleEdit, DEFAULT_PRIORITY,
};
pub use pipeline::{Pipeline, PipelineOperator, PostablePipeline};
pub use validation::ValidationError;

/// Generate a record id (UUID v4, hyphenated).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
