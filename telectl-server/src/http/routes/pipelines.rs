//! Pipeline endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use telectl_core::{Pipeline, PostablePipeline};

use super::parse_positive;
use crate::db::PipelineRepo;
use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;

/// Pipelines of one config version plus rows that failed to parse
#[derive(Serialize)]
pub struct PipelineListResponse {
    pub pipelines: Vec<Pipeline>,
    pub errors: Vec<String>,
}

/// POST /pipelines - store a new pipeline
async fn create_pipeline(
    State(state): State<Arc<AppState>>,
    ValidJson(postable): ValidJson<PostablePipeline>,
) -> Result<(StatusCode, Json<Pipeline>), ApiError> {
    let pipeline = PipelineRepo::new(&state.pool).insert(postable).await?;
    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipelines/{id}
async fn get_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Pipeline>, ApiError> {
    PipelineRepo::new(&state.pool)
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            resource: "pipeline",
            id,
        })
}

/// DELETE /pipelines/{id}
async fn delete_pipeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    PipelineRepo::new(&state.pool).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /pipelines/version/{version}
async fn pipelines_by_version(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
) -> Result<Json<PipelineListResponse>, ApiError> {
    let version = parse_positive("version", &version)?;
    let listing = PipelineRepo::new(&state.pool).by_version(version).await?;

    Ok(Json(PipelineListResponse {
        errors: listing.error_messages(),
        pipelines: listing.items,
    }))
}

/// Pipeline routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pipelines", post(create_pipeline))
        .route("/pipelines/{id}", get(get_pipeline).delete(delete_pipeline))
        .route("/pipelines/version/{version}", get(pipelines_by_version))
}
