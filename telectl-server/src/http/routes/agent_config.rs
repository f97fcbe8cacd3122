//! Agent config version endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{AgentConfigRepo, AgentConfigVersion};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidElementType, ValidJson};
use crate::http::server::AppState;

/// Create version request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    #[serde(default)]
    pub element_ids: Vec<String>,
}

/// POST /agent_config/{element_type}/versions
async fn create_version(
    State(state): State<Arc<AppState>>,
    ValidElementType(element_type): ValidElementType,
    ValidJson(req): ValidJson<CreateVersionRequest>,
) -> Result<(StatusCode, Json<AgentConfigVersion>), ApiError> {
    let version = AgentConfigRepo::new(&state.pool)
        .create_version(element_type, &req.element_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// GET /agent_config/{element_type}/versions/latest
async fn latest_version(
    State(state): State<Arc<AppState>>,
    ValidElementType(element_type): ValidElementType,
) -> Result<Json<AgentConfigVersion>, ApiError> {
    AgentConfigRepo::new(&state.pool)
        .latest_version(element_type)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound {
            resource: "agent config version",
            id: format!("{}/latest", element_type),
        })
}

/// Agent config routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/agent_config/{element_type}/versions", post(create_version))
        .route("/agent_config/{element_type}/versions/latest", get(latest_version))
}

#[cfg(test)]
mod tests {
    use crate::http::routes::test_support::{offline_router, send};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn unknown_element_type_is_400() {
        let (status, body) = send(
            offline_router(),
            Method::GET,
            "/api/v1/agent_config/dashboards/versions/latest",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn undecodable_element_type_is_bad_request() {
        let (status, body) = send(
            offline_router(),
            Method::GET,
            "/api/v1/agent_config/%FF/versions/latest",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn blank_element_id_is_400() {
        let (status, _) = send(
            offline_router(),
            Method::POST,
            "/api/v1/agent_config/log_pipelines/versions",
            Some(r#"{"elementIds": ["p1", " "]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
