use axum::{
    extract::Request,
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Emits one `request_completed` event per request. Rejected requests are
/// logged at warn level so refused uploads stand out.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_bytes = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_client_error() {
        warn!(
            target: "metrics",
            %method,
            %path,
            status,
            request_bytes,
            latency_ms,
            "request_completed"
        );
    } else {
        info!(
            target: "metrics",
            %method,
            %path,
            status,
            request_bytes,
            latency_ms,
            "request_completed"
        );
    }

    response
}
