//! Pipeline repository
//!
//! - insert: validate, assign id, serialize operators, one INSERT
//! - by_version: JOIN through the agent config tables (no N+1)
//! - get: zero/one/many rows are three different outcomes
//! - delete: idempotent

use sqlx::{FromRow, PgPool};
use telectl_core::pipeline::parse_operators;
use telectl_core::{DeployStatus, ElementType, Pipeline, PostablePipeline};

use crate::db::rows::{at_most_one, Listing, RowError};
use crate::db::DbError;

const RESOURCE: &str = "pipeline";

/// Pipeline row as stored
#[derive(Debug, Clone, FromRow)]
pub struct PipelineRow {
    pub id: String,
    pub order_id: i32,
    pub enabled: bool,
    pub name: String,
    pub alias: String,
    pub filter: String,
    pub config_json: String,
    pub deployment_status: String,
    pub deployment_sequence: i32,
}

impl PipelineRow {
    /// Map back to the domain type, parsing the config column.
    pub fn parse(self) -> Result<Pipeline, RowError> {
        let config = parse_operators(&self.config_json)
            .map_err(|e| RowError::new(&self.id, format!("invalid pipeline config: {}", e)))?;
        let deploy_status = self
            .deployment_status
            .parse::<DeployStatus>()
            .map_err(|e| RowError::new(&self.id, e))?;

        Ok(Pipeline {
            id: self.id,
            order_id: self.order_id,
            enabled: self.enabled,
            name: self.name,
            alias: self.alias,
            filter: self.filter,
            config,
            raw_config: self.config_json,
            deploy_status,
            deploy_sequence: self.deployment_sequence,
        })
    }
}

/// Pipeline repository
pub struct PipelineRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PipelineRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submitted pipeline.
    ///
    /// Validation happens before the statement is built, so invalid input
    /// never reaches the database.
    pub async fn insert(&self, postable: PostablePipeline) -> Result<Pipeline, DbError> {
        let pipeline = postable.into_pipeline()?;

        sqlx::query(
            r#"
            INSERT INTO pipelines
                (id, order_id, enabled, name, alias, filter, config_json,
                 deployment_status, deployment_sequence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&pipeline.id)
        .bind(pipeline.order_id)
        .bind(pipeline.enabled)
        .bind(&pipeline.name)
        .bind(&pipeline.alias)
        .bind(&pipeline.filter)
        .bind(&pipeline.raw_config)
        .bind(pipeline.deploy_status.as_str())
        .bind(pipeline.deploy_sequence)
        .execute(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, alias = %pipeline.alias, "failed to insert pipeline");
            e
        })?;

        tracing::info!(id = %pipeline.id, alias = %pipeline.alias, "pipeline created");
        Ok(pipeline)
    }

    /// Pipelines that belong to a given agent config version.
    pub async fn by_version(&self, version: i32) -> Result<Listing<Pipeline>, DbError> {
        let rows: Vec<PipelineRow> = sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.order_id,
                p.enabled,
                p.name,
                p.alias,
                p.filter,
                p.config_json,
                p.deployment_status,
                p.deployment_sequence
            FROM pipelines p
            JOIN agent_config_elements e ON e.element_id = p.id
            JOIN agent_config_versions v ON v.id = e.version_id
            WHERE e.element_type = $1
            AND v.version = $2
            ORDER BY p.order_id ASC
            "#,
        )
        .bind(ElementType::LogPipelines.as_str())
        .bind(version)
        .fetch_all(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, version, "failed to get pipelines for version");
            e
        })?;

        Ok(Listing::from_rows(rows, PipelineRow::parse))
    }

    /// Get a single pipeline by id; `Ok(None)` when it does not exist.
    pub async fn get(&self, id: &str) -> Result<Option<Pipeline>, DbError> {
        let rows: Vec<PipelineRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, enabled, name, alias, filter, config_json,
                   deployment_status, deployment_sequence
            FROM pipelines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        match at_most_one(rows, RESOURCE, id)? {
            None => Ok(None),
            Some(row) => row.parse().map(Some).map_err(|e| {
                tracing::error!(id, reason = %e.reason, "invalid pipeline config found");
                DbError::InvalidRow {
                    resource: RESOURCE,
                    id: e.id,
                    reason: e.reason,
                }
            }),
        }
    }

    /// Delete a pipeline by id (idempotent).
    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        tracing::info!(id, deleted = result.rows_affected(), "pipeline delete");
        Ok(())
    }
}
