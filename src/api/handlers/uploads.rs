use crate::AppState;
use crate::api::error::AppError;
use crate::models::ValidationResult;
use crate::services::upload_coordinator::{CreateUploadRequest, CreateUploadResponse};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};

/// Contents of an upload form: at most one file plus an optional session id.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub session_id: Option<String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("O envio excede o tamanho máximo permitido".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads the multipart body. A second `file` field is refused; unknown fields are skipped.
pub async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                if form.file.is_some() {
                    return Err(AppError::BadRequest(
                        "Envie apenas um arquivo por requisição".to_string(),
                    ));
                }

                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();

                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "sessionId" | "session_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() && text != "null" {
                    form.session_id = Some(text.to_string());
                }
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(form)
}

/// Parses the form and drains whatever is left of the stream if parsing
/// stopped early, so the client is not hit by a connection reset.
async fn read_form_or_drain(multipart: &mut Multipart) -> Result<UploadForm, AppError> {
    match read_upload_form(multipart).await {
        Ok(form) => Ok(form),
        Err(e) => {
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

fn require_file(form_file: Option<UploadedFile>) -> Result<UploadedFile, AppError> {
    form_file.ok_or_else(|| AppError::BadRequest("Nenhum arquivo enviado".to_string()))
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, content_type = "multipart/form-data", description = "Image file (`file`) and optional `sessionId`"),
    responses(
        (status = 200, description = "File accepted and session completed", body = CreateUploadResponse),
        (status = 400, description = "Malformed request, extension or format rejected"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already holds a file"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not an image"),
        (status = 422, description = "Corrupted file"),
        (status = 429, description = "Session capacity exhausted")
    ),
    tag = "uploads"
)]
pub async fn create_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CreateUploadResponse>, AppError> {
    let form = read_form_or_drain(&mut multipart).await?;
    let file = require_file(form.file)?;

    let response = state.uploads.create_upload(CreateUploadRequest {
        file_name: file.file_name,
        mime_type: file.content_type,
        file_size: file.data.len() as u64,
        file_buffer: file.data,
        session_id: form.session_id,
    })?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/validate",
    request_body(content = Multipart, content_type = "multipart/form-data", description = "Image file (`file`) to check"),
    responses(
        (status = 200, description = "Outcome of the validation chain; nothing is stored", body = ValidationResult),
        (status = 400, description = "Malformed request")
    ),
    tag = "uploads"
)]
pub async fn validate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ValidationResult>, AppError> {
    let form = read_form_or_drain(&mut multipart).await?;
    let file = require_file(form.file)?;

    Ok(Json(state.uploads.validate_only(
        &file.file_name,
        file.data.len() as u64,
        &file.content_type,
        &file.data,
    )))
}
