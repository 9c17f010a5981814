use crate::AppState;
use crate::api::error::AppError;
use crate::services::upload_coordinator::{ResetSessionResponse, SessionResponse};
use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::IntoResponse,
};

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session id (UUID)")
    ),
    responses(
        (status = 200, description = "Current state of the session", body = SessionResponse),
        (status = 400, description = "Malformed session id"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(state.uploads.get_session(&id)?))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    params(
        ("id" = String, Path, description = "Session id (UUID)")
    ),
    responses(
        (status = 200, description = "Session replaced by an empty one under a new id", body = ResetSessionResponse),
        (status = 400, description = "Malformed session id"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetSessionResponse>, AppError> {
    Ok(Json(state.uploads.reset_session(&id)?))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/file",
    params(
        ("id" = String, Path, description = "Session id (UUID)")
    ),
    responses(
        (status = 200, description = "The uploaded image", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed session id"),
        (status = 404, description = "Session not found or holds no file")
    ),
    tag = "sessions"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let file = state.uploads.download(&id)?;

    let content_type =
        HeaderValue::from_str(&file.mime_type).context("Stored MIME type is not a valid header")?;
    let content_disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&file.file_name)
    ))
    .context("Download file name is not a valid header")?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        file.buffer,
    ))
}

/// Keeps printable ASCII only, minus the quote and backslash that would
/// break a quoted header parameter.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_filename() {
        assert_eq!(header_safe_filename("photo.png"), "photo.png");
        assert_eq!(header_safe_filename("a\"b\\c\n.png"), "a_b_c_.png");
        assert_eq!(header_safe_filename("foto_férias.jpg"), "foto_f_rias.jpg");
        assert_eq!(header_safe_filename("my photo.png"), "my photo.png");
        assert!(HeaderValue::from_str(&header_safe_filename("a\u{7f}é\t.png")).is_ok());
    }
}
