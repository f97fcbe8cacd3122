//! Ingestion rule repository
//!
//! Same shape as the pipeline repository plus the two bulk status updates
//! the deploy orchestrator drives. Those updates are unconditional: no
//! compare-and-swap, the database serializes concurrent writers.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use telectl_core::ingestion_rule::parse_rule_config;
use telectl_core::{
    DeployStatus, IngestionRule, IngestionRuleType, IngestionSource, PostableIngestionRule,
    RuleEdit, ValidationError, SEQ_REDEPLOY_QUEUED,
};

use crate::db::rows::{at_most_one, Listing, RowError};
use crate::db::DbError;

const RESOURCE: &str = "ingestion rule";

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, source, rule_type, rule_subtype, priority, config_json,
           deployment_status, deployment_sequence, error_message,
           created_at, updated_at
    FROM ingestion_rules
"#;

/// Ingestion rule row as stored
#[derive(Debug, Clone, FromRow)]
pub struct IngestionRuleRow {
    pub id: String,
    pub name: String,
    pub source: String,
    pub rule_type: String,
    pub rule_subtype: String,
    pub priority: i32,
    pub config_json: String,
    pub deployment_status: String,
    pub deployment_sequence: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionRuleRow {
    /// Map back to the domain type, parsing the config column.
    pub fn parse(self) -> Result<IngestionRule, RowError> {
        let config = parse_rule_config(&self.config_json)
            .map_err(|e| RowError::new(&self.id, format!("invalid rule config: {}", e)))?;
        let source = self
            .source
            .parse::<IngestionSource>()
            .map_err(|e| RowError::new(&self.id, e))?;
        let rule_type = self
            .rule_type
            .parse::<IngestionRuleType>()
            .map_err(|e| RowError::new(&self.id, e))?;
        let deploy_status = self
            .deployment_status
            .parse::<DeployStatus>()
            .map_err(|e| RowError::new(&self.id, e))?;

        Ok(IngestionRule {
            id: self.id,
            name: self.name,
            source,
            rule_type,
            rule_subtype: self.rule_subtype,
            priority: self.priority,
            config,
            raw_config: self.config_json,
            deploy_status,
            deploy_sequence: self.deployment_sequence,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Deploy sequences handed in by the orchestrator are positive; the negative
/// values are markers owned by this repository.
fn check_sequence(seq: i32) -> Result<(), ValidationError> {
    if seq < 1 {
        return Err(ValidationError::OutOfRange {
            field: "sequence",
            min: 1,
            max: i32::MAX as i64,
        });
    }
    Ok(())
}

/// Ingestion rule repository
pub struct IngestionRuleRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> IngestionRuleRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submitted rule. Priority defaults to 1 when omitted.
    pub async fn insert(&self, postable: PostableIngestionRule) -> Result<IngestionRule, DbError> {
        let rule = postable.into_rule()?;

        sqlx::query(
            r#"
            INSERT INTO ingestion_rules
                (id, name, source, rule_type, rule_subtype, priority, config_json,
                 deployment_status, deployment_sequence, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(rule.source.as_str())
        .bind(rule.rule_type.as_str())
        .bind(&rule.rule_subtype)
        .bind(rule.priority)
        .bind(&rule.raw_config)
        .bind(rule.deploy_status.as_str())
        .bind(rule.deploy_sequence)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, name = %rule.name, "failed to insert ingestion rule");
            e
        })?;

        tracing::info!(id = %rule.id, rule_type = %rule.rule_type, "ingestion rule created");
        Ok(rule)
    }

    /// Apply a user edit.
    ///
    /// Whatever the rule's previous state, it goes back to pending with the
    /// redeploy-queued sequence so the next deploy cycle picks it up.
    pub async fn edit(&self, id: &str, edit: RuleEdit) -> Result<IngestionRule, DbError> {
        let prepared = edit.prepare()?;

        let row: Option<IngestionRuleRow> = sqlx::query_as(
            r#"
            UPDATE ingestion_rules
            SET name = $1,
                rule_subtype = $2,
                priority = $3,
                config_json = $4,
                deployment_status = $5,
                deployment_sequence = $6,
                updated_at = NOW()
            WHERE id = $7
            AND rule_type = $8
            RETURNING id, name, source, rule_type, rule_subtype, priority, config_json,
                      deployment_status, deployment_sequence, error_message,
                      created_at, updated_at
            "#,
        )
        .bind(&prepared.name)
        .bind(&prepared.rule_subtype)
        .bind(prepared.priority)
        .bind(&prepared.raw_config)
        .bind(DeployStatus::Pending.as_str())
        .bind(SEQ_REDEPLOY_QUEUED)
        .bind(id)
        .bind(prepared.rule_type.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "failed to update ingestion rule");
            e
        })?;

        let row = row.ok_or_else(|| DbError::NotFound {
            resource: RESOURCE,
            id: id.to_owned(),
        })?;

        tracing::info!(id, "ingestion rule edited, queued for redeploy");
        row.parse().map_err(|e| DbError::InvalidRow {
            resource: RESOURCE,
            id: e.id,
            reason: e.reason,
        })
    }

    /// All rules of a type.
    pub async fn list_by_type(
        &self,
        rule_type: IngestionRuleType,
    ) -> Result<Listing<IngestionRule>, DbError> {
        let sql = format!(
            "{} WHERE rule_type = $1 ORDER BY priority DESC, created_at ASC",
            SELECT_COLUMNS
        );
        let rows: Vec<IngestionRuleRow> = sqlx::query_as(&sql)
            .bind(rule_type.as_str())
            .fetch_all(self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %rule_type, "failed to list ingestion rules");
                e
            })?;

        Ok(Listing::from_rows(rows, IngestionRuleRow::parse))
    }

    /// Rules of a type currently in a given deployment status.
    pub async fn list_by_type_and_status(
        &self,
        rule_type: IngestionRuleType,
        status: DeployStatus,
    ) -> Result<Listing<IngestionRule>, DbError> {
        let sql = format!(
            "{} WHERE rule_type = $1 AND deployment_status = $2 ORDER BY priority DESC, created_at ASC",
            SELECT_COLUMNS
        );
        let rows: Vec<IngestionRuleRow> = sqlx::query_as(&sql)
            .bind(rule_type.as_str())
            .bind(status.as_str())
            .fetch_all(self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %rule_type, %status, "failed to list ingestion rules");
                e
            })?;

        Ok(Listing::from_rows(rows, IngestionRuleRow::parse))
    }

    /// Get a single rule by id; `Ok(None)` when it does not exist.
    pub async fn get(&self, id: &str) -> Result<Option<IngestionRule>, DbError> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let rows: Vec<IngestionRuleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        match at_most_one(rows, RESOURCE, id)? {
            None => Ok(None),
            Some(row) => row.parse().map(Some).map_err(|e| {
                tracing::error!(id, reason = %e.reason, "invalid rule config found");
                DbError::InvalidRow {
                    resource: RESOURCE,
                    id: e.id,
                    reason: e.reason,
                }
            }),
        }
    }

    /// Delete a rule by id (idempotent).
    pub async fn delete(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM ingestion_rules WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        tracing::info!(id, deleted = result.rows_affected(), "ingestion rule delete");
        Ok(())
    }

    /// Mark every rule of a type as deploying under `seq`.
    ///
    /// Returns the number of rules touched.
    pub async fn mark_deploying(&self, seq: i32, rule_type: IngestionRuleType) -> Result<u64, DbError> {
        check_sequence(seq)?;

        let result = sqlx::query(
            r#"
            UPDATE ingestion_rules
            SET deployment_status = $1,
                deployment_sequence = $2
            WHERE rule_type = $3
            "#,
        )
        .bind(DeployStatus::Deploying.as_str())
        .bind(seq)
        .bind(rule_type.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, seq, %rule_type, "failed to mark rules deploying");
            e
        })?;

        tracing::info!(seq, %rule_type, rules = result.rows_affected(), "rules marked deploying");
        Ok(result.rows_affected())
    }

    /// Record the outcome of deployment `seq` on every rule it carried.
    ///
    /// Only terminal statuses are accepted. Returns the number of rules touched.
    pub async fn update_status_by_seq(
        &self,
        seq: i32,
        status: DeployStatus,
        error_message: Option<&str>,
    ) -> Result<u64, DbError> {
        check_sequence(seq)?;
        if !status.is_terminal() {
            return Err(ValidationError::InvalidVariant {
                field: "status",
                value: status.as_str().to_owned(),
            }
            .into());
        }

        let result = sqlx::query(
            r#"
            UPDATE ingestion_rules
            SET deployment_status = $1,
                updated_at = $2,
                error_message = $3
            WHERE deployment_sequence = $4
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(error_message)
        .bind(seq)
        .execute(self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, seq, "failed to update ingestion rules by sequence");
            e
        })?;

        tracing::info!(seq, %status, rules = result.rows_affected(), "deploy outcome recorded");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use telectl_core::{DEFAULT_PRIORITY, SEQ_NEVER_DEPLOYED};

    fn row(id: &str, config_json: &str, source: &str) -> IngestionRuleRow {
        let now = Utc::now();
        IngestionRuleRow {
            id: id.into(),
            name: "drop noisy".into(),
            source: source.into(),
            rule_type: "drop".into(),
            rule_subtype: String::new(),
            priority: 3,
            config_json: config_json.into(),
            deployment_status: "PENDING".into(),
            deployment_sequence: SEQ_NEVER_DEPLOYED,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_parses() {
        let rule = row("r1", r#"{"dropConfig":{"conditions":"a = 1"}}"#, "logs")
            .parse()
            .unwrap();
        assert_eq!(rule.source, IngestionSource::Logs);
        assert_eq!(rule.rule_type, IngestionRuleType::Drop);
        assert_eq!(rule.config.drop_config.unwrap().conditions, "a = 1");
    }

    #[test]
    fn unknown_source_is_row_error() {
        let err = row("r2", "{}", "profiles").parse().unwrap_err();
        assert_eq!(err.id, "r2");
        assert!(err.reason.contains("source"));
    }

    #[test]
    fn listing_skips_malformed_config() {
        let rows = vec![
            row("ok", r#"{"dropConfig":{"conditions":"a = 1"}}"#, "traces"),
            row("broken", "[1, 2", "traces"),
        ];
        let listing = Listing::from_rows(rows, IngestionRuleRow::parse);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, "ok");
        assert_eq!(listing.errors[0].id, "broken");
    }

    #[test]
    fn reserved_sequences_rejected() {
        assert!(check_sequence(1).is_ok());
        assert!(check_sequence(0).is_err());
        assert!(check_sequence(SEQ_REDEPLOY_QUEUED).is_err());
    }

    fn drop_postable(name: &str, priority: Option<i32>) -> PostableIngestionRule {
        serde_json::from_value(json!({
            "name": name,
            "source": "logs",
            "ruleType": "drop",
            "priority": priority,
            "config": { "dropConfig": { "conditions": "severity_text = 'DEBUG'" } }
        }))
        .unwrap()
    }

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn insert_defaults_priority() {
        let pool = test_pool().await;
        let repo = IngestionRuleRepo::new(&pool);

        let rule = repo.insert(drop_postable("defaults", None)).await.unwrap();
        let stored = repo.get(&rule.id).await.unwrap().expect("rule exists");
        assert_eq!(stored.priority, DEFAULT_PRIORITY);
        assert_eq!(stored.deploy_sequence, SEQ_NEVER_DEPLOYED);
        assert_eq!(stored.deploy_status, DeployStatus::Pending);
        repo.delete(&rule.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn edit_always_requeues() {
        let pool = test_pool().await;
        let repo = IngestionRuleRepo::new(&pool);
        let rule = repo.insert(drop_postable("requeue", Some(4))).await.unwrap();

        sqlx::query(
            "UPDATE ingestion_rules SET deployment_status = 'DEPLOYED', deployment_sequence = 17 WHERE id = $1",
        )
        .bind(&rule.id)
        .execute(&pool)
        .await
        .unwrap();

        let edit = RuleEdit {
            rule_type: IngestionRuleType::Drop,
            name: "requeue renamed".into(),
            rule_subtype: String::new(),
            priority: None,
            config: rule.config.clone(),
        };
        let edited = repo.edit(&rule.id, edit).await.unwrap();
        assert_eq!(edited.name, "requeue renamed");
        assert_eq!(edited.priority, DEFAULT_PRIORITY);
        assert_eq!(edited.deploy_status, DeployStatus::Pending);
        assert_eq!(edited.deploy_sequence, SEQ_REDEPLOY_QUEUED);
        repo.delete(&rule.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn edit_missing_rule_is_not_found() {
        let pool = test_pool().await;
        let edit = RuleEdit {
            rule_type: IngestionRuleType::Drop,
            name: "ghost".into(),
            rule_subtype: String::new(),
            priority: None,
            config: drop_postable("ghost", None).config,
        };
        let err = IngestionRuleRepo::new(&pool)
            .edit("does-not-exist", edit)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn deploy_bookkeeping() {
        let pool = test_pool().await;
        let repo = IngestionRuleRepo::new(&pool);
        let rule = repo.insert(drop_postable("deploy", None)).await.unwrap();

        let (seq,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(deployment_sequence), 0) + 1 FROM ingestion_rules",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let touched = repo.mark_deploying(seq, IngestionRuleType::Drop).await.unwrap();
        assert!(touched >= 1);

        let deploying = repo
            .list_by_type_and_status(IngestionRuleType::Drop, DeployStatus::Deploying)
            .await
            .unwrap();
        assert!(deploying.items.iter().any(|r| r.id == rule.id));

        repo.update_status_by_seq(seq, DeployStatus::Failed, Some("agent rejected config"))
            .await
            .unwrap();
        let failed = repo.get(&rule.id).await.unwrap().expect("rule exists");
        assert_eq!(failed.deploy_status, DeployStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("agent rejected config"));

        let err = repo
            .update_status_by_seq(seq, DeployStatus::Deploying, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        repo.delete(&rule.id).await.unwrap();
    }
}
