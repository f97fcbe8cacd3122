//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the shared pool, one statement per call
//! - Validates input before building any statement
//! - Uses transactions for multi-step operations

pub mod agent_config;
pub mod ingestion_rules;
pub mod pipelines;

pub use agent_config::{AgentConfigRepo, AgentConfigVersion};
pub use ingestion_rules::{IngestionRuleRepo, IngestionRuleRow};
pub use pipelines::{PipelineRepo, PipelineRow};
