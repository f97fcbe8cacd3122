//! Ingestion rule endpoints
//!
//! Drop and sampling listings share one handler keyed by element type.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use telectl_core::{
    DeployStatus, ElementType, IngestionRule, IngestionRuleType, PostableIngestionRule, RuleEdit,
    ValidationError,
};

use super::parse_positive;
use crate::db::IngestionRuleRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidQuery};
use crate::http::server::AppState;

/// Rules of one type plus rows that failed to parse
#[derive(Serialize)]
pub struct RuleListResponse {
    pub rules: Vec<IngestionRule>,
    pub errors: Vec<String>,
}

/// Optional status filter on listings
#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// Mark-deploying request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub rule_type: IngestionRuleType,
    pub sequence: i32,
}

/// Deployment outcome request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcomeRequest {
    pub status: DeployStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Rows touched by a bulk status update
#[derive(Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

/// POST /ingestion_rules
async fn create_rule(
    State(state): State<Arc<AppState>>,
    ValidJson(postable): ValidJson<PostableIngestionRule>,
) -> Result<(StatusCode, Json<IngestionRule>), ApiError> {
    let rule = IngestionRuleRepo::new(&state.pool).insert(postable).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// GET /ingestion_rules/{id}
async fn get_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IngestionRule>, ApiError> {
    IngestionRuleRepo::new(&state.pool)
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            resource: "ingestion rule",
            id,
        })
}

/// PUT /ingestion_rules/{id}
async fn edit_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(edit): ValidJson<RuleEdit>,
) -> Result<Json<IngestionRule>, ApiError> {
    let rule = IngestionRuleRepo::new(&state.pool).edit(&id, edit).await?;
    Ok(Json(rule))
}

/// DELETE /ingestion_rules/{id}
async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    IngestionRuleRepo::new(&state.pool).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the rules backing one element type, optionally filtered by status.
async fn list_rules_for_element(
    state: &AppState,
    element_type: ElementType,
    filter: StatusFilter,
) -> Result<Json<RuleListResponse>, ApiError> {
    let rule_type = element_type.rule_type().ok_or_else(|| ValidationError::InvalidVariant {
        field: "element type",
        value: element_type.as_str().to_owned(),
    })?;
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<DeployStatus>)
        .transpose()?;

    let repo = IngestionRuleRepo::new(&state.pool);
    let listing = match status {
        Some(status) => repo.list_by_type_and_status(rule_type, status).await?,
        None => repo.list_by_type(rule_type).await?,
    };

    Ok(Json(RuleListResponse {
        errors: listing.error_messages(),
        rules: listing.items,
    }))
}

/// GET /drop_rules
async fn list_drop_rules(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<StatusFilter>,
) -> Result<Json<RuleListResponse>, ApiError> {
    list_rules_for_element(&state, ElementType::DropRules, filter).await
}

/// GET /sampling_rules
async fn list_sampling_rules(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<StatusFilter>,
) -> Result<Json<RuleListResponse>, ApiError> {
    list_rules_for_element(&state, ElementType::SamplingRules, filter).await
}

/// POST /ingestion_rules/deploy
async fn mark_deploying(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<DeployRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let updated = IngestionRuleRepo::new(&state.pool)
        .mark_deploying(req.sequence, req.rule_type)
        .await?;
    Ok(Json(UpdatedResponse { updated }))
}

/// POST /ingestion_rules/deploy/{sequence}/status
async fn record_deploy_outcome(
    State(state): State<Arc<AppState>>,
    Path(sequence): Path<String>,
    ValidJson(req): ValidJson<DeployOutcomeRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let sequence = parse_positive("sequence", &sequence)?;
    let updated = IngestionRuleRepo::new(&state.pool)
        .update_status_by_seq(sequence, req.status, req.error_message.as_deref())
        .await?;
    Ok(Json(UpdatedResponse { updated }))
}

/// Ingestion rule routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ingestion_rules", post(create_rule))
        .route("/ingestion_rules/deploy", post(mark_deploying))
        .route("/ingestion_rules/deploy/{sequence}/status", post(record_deploy_outcome))
        .route(
            "/ingestion_rules/{id}",
            get(get_rule).put(edit_rule).delete(delete_rule),
        )
        .route("/drop_rules", get(list_drop_rules))
        .route("/sampling_rules", get(list_sampling_rules))
}
