//! Agent config version repository
//!
//! A version is a numbered snapshot of which elements (pipelines today)
//! make up the config pushed to agents for one element type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use telectl_core::{new_id, ElementType, ValidationError};

use crate::db::DbError;

/// A stored config version with the ids of its elements
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigVersion {
    pub id: String,
    pub element_type: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub element_ids: Vec<String>,
}

/// Drop blanks and repeats, keeping first-seen order.
fn unique_ids(element_ids: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(element_ids.len());
    for id in element_ids {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::Empty { field: "elementIds" });
        }
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_owned());
        }
    }
    Ok(out)
}

/// Agent config version repository
pub struct AgentConfigRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AgentConfigRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the next version for `element_type` holding `element_ids`.
    ///
    /// Number allocation and element rows commit together. A per-type
    /// advisory lock keeps concurrent creators from racing on the number.
    pub async fn create_version(
        &self,
        element_type: ElementType,
        element_ids: &[String],
    ) -> Result<AgentConfigVersion, DbError> {
        let ids = unique_ids(element_ids)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(element_type.as_str())
            .execute(&mut *tx)
            .await?;

        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM agent_config_versions WHERE element_type = $1",
        )
        .bind(element_type.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let (id, created_at): (String, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO agent_config_versions (id, element_type, version)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(new_id())
        .bind(element_type.as_str())
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        for element_id in &ids {
            sqlx::query(
                r#"
                INSERT INTO agent_config_elements (id, version_id, element_id, element_type)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(element_id)
            .bind(element_type.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(%element_type, version = next, elements = ids.len(), "agent config version created");
        Ok(AgentConfigVersion {
            id,
            element_type: element_type.as_str().to_owned(),
            version: next,
            created_at,
            element_ids: ids,
        })
    }

    /// Highest version for `element_type`, if any has been created.
    pub async fn latest_version(
        &self,
        element_type: ElementType,
    ) -> Result<Option<AgentConfigVersion>, DbError> {
        let version: Option<AgentConfigVersion> = sqlx::query_as(
            r#"
            SELECT
                v.id,
                v.element_type,
                v.version,
                v.created_at,
                COALESCE(
                    array_agg(e.element_id ORDER BY e.element_id) FILTER (WHERE e.element_id IS NOT NULL),
                    '{}'
                ) AS element_ids
            FROM agent_config_versions v
            LEFT JOIN agent_config_elements e ON e.version_id = v.id
            WHERE v.element_type = $1
            GROUP BY v.id, v.element_type, v.version, v.created_at
            ORDER BY v.version DESC
            LIMIT 1
            "#,
        )
        .bind(element_type.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_deduplicated_in_order() {
        let ids = vec!["b".to_string(), "a".into(), "b".into(), " a ".into()];
        assert_eq!(unique_ids(&ids).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn blank_id_rejected() {
        let ids = vec!["a".to_string(), "  ".into()];
        assert!(matches!(unique_ids(&ids), Err(ValidationError::Empty { .. })));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn versions_increase_per_type() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        let repo = AgentConfigRepo::new(&pool);

        let first = repo
            .create_version(ElementType::SamplingRules, &["x".to_string()])
            .await
            .unwrap();
        let second = repo
            .create_version(ElementType::SamplingRules, &[])
            .await
            .unwrap();
        assert_eq!(second.version, first.version + 1);

        let latest = repo
            .latest_version(ElementType::SamplingRules)
            .await
            .unwrap()
            .expect("a version exists");
        assert_eq!(latest.version, second.version);
        assert!(latest.element_ids.is_empty());
    }
}
