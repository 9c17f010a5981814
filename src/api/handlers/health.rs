use crate::AppState;
use crate::utils::validation::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES};
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub max_sessions: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health and session usage", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.uploads.store();

    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: store.count(),
        max_sessions: store.max_sessions(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRulesResponse {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

/// Limits the client can check before sending a file.
#[utoipa::path(
    get,
    path = "/system/validation-rules",
    responses(
        (status = 200, description = "Upload validation rules", body = ValidationRulesResponse)
    ),
    tag = "system"
)]
pub async fn get_validation_rules(State(state): State<AppState>) -> Json<ValidationRulesResponse> {
    Json(ValidationRulesResponse {
        max_file_size: state.config.max_file_size,
        allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
    })
}
