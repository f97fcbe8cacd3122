//! Schema migrations
//!
//! Every statement is idempotent so `run` is safe on each startup.

use sqlx::PgPool;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "pipelines",
        r#"
        CREATE TABLE IF NOT EXISTS pipelines (
            id TEXT PRIMARY KEY,
            order_id INTEGER NOT NULL,
            enabled BOOLEAN NOT NULL DEFAULT FALSE,
            name TEXT NOT NULL,
            alias TEXT NOT NULL,
            filter TEXT NOT NULL,
            config_json TEXT NOT NULL,
            deployment_status TEXT NOT NULL DEFAULT 'PENDING',
            deployment_sequence INTEGER NOT NULL DEFAULT -1,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "ingestion_rules",
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_rules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            source TEXT NOT NULL,
            rule_type TEXT NOT NULL,
            rule_subtype TEXT NOT NULL DEFAULT '',
            priority INTEGER NOT NULL DEFAULT 1,
            config_json TEXT NOT NULL,
            deployment_status TEXT NOT NULL DEFAULT 'PENDING',
            deployment_sequence INTEGER NOT NULL DEFAULT -1,
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "ingestion_rules_type_status_idx",
        "CREATE INDEX IF NOT EXISTS ingestion_rules_type_status_idx ON ingestion_rules (rule_type, deployment_status)",
    ),
    (
        "ingestion_rules_sequence_idx",
        "CREATE INDEX IF NOT EXISTS ingestion_rules_sequence_idx ON ingestion_rules (deployment_sequence)",
    ),
    (
        "agent_config_versions",
        r#"
        CREATE TABLE IF NOT EXISTS agent_config_versions (
            id TEXT PRIMARY KEY,
            element_type TEXT NOT NULL,
            version INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (element_type, version)
        )
        "#,
    ),
    (
        "agent_config_elements",
        r#"
        CREATE TABLE IF NOT EXISTS agent_config_elements (
            id TEXT PRIMARY KEY,
            version_id TEXT NOT NULL REFERENCES agent_config_versions(id) ON DELETE CASCADE,
            element_id TEXT NOT NULL,
            element_type TEXT NOT NULL,
            UNIQUE (version_id, element_id)
        )
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running schema migrations...");

    for (name, sql) in STATEMENTS {
        sqlx::query(sql).execute(pool).await.map_err(|e| {
            tracing::error!(migration = name, error = %e, "migration failed");
            e
        })?;
        tracing::debug!(migration = name, "applied");
    }

    tracing::info!(count = STATEMENTS.len(), "Schema migrations complete");
    Ok(())
}
