pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::session_store::SessionStore;
use crate::services::upload_coordinator::UploadCoordinator;
use crate::utils::validation::FileValidator;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::health::get_validation_rules,
        api::handlers::uploads::create_upload,
        api::handlers::uploads::validate_upload,
        api::handlers::sessions::get_session,
        api::handlers::sessions::reset_session,
        api::handlers::sessions::download_file,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::health::ValidationRulesResponse,
            services::upload_coordinator::CreateUploadResponse,
            services::upload_coordinator::SessionResponse,
            services::upload_coordinator::ResetSessionResponse,
            models::ValidationResult,
            models::ValidationDetails,
            models::ImageFormat,
            models::SessionStatus,
            error::ErrorKind,
        )
    ),
    tags(
        (name = "uploads", description = "Image upload and validation"),
        (name = "sessions", description = "Upload session lifecycle"),
        (name = "system", description = "Health and limits")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadCoordinator>,
    pub config: UploadConfig,
}

impl AppState {
    /// Builds the session store and coordinator owned by this state.
    pub fn new(config: UploadConfig) -> Self {
        let store = Arc::new(SessionStore::new(config.max_sessions));
        let validator = FileValidator::new(config.max_file_size);

        Self {
            uploads: Arc::new(UploadCoordinator::new(validator, store)),
            config,
        }
    }
}

fn cors_layer(config: &UploadConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers(Any);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/system/validation-rules",
            get(api::handlers::health::get_validation_rules),
        )
        .route(
            "/upload",
            post(api::handlers::uploads::create_upload)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/validate",
            post(api::handlers::uploads::validate_upload)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/sessions/:id", get(api::handlers::sessions::get_session))
        .route(
            "/sessions/:id/reset",
            post(api::handlers::sessions::reset_session),
        )
        .route(
            "/sessions/:id/file",
            get(api::handlers::sessions::download_file),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(api::middleware::request_id::request_span)
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
