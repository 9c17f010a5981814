use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::error::{ErrorKind, UploadError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Every failure of the upload core is caused by the client.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::InvalidExtension => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidFormat => StatusCode::BAD_REQUEST,
        ErrorKind::NotAnImage => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorKind::CorruptedFile => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::SessionLimitReached => StatusCode::CONFLICT,
        ErrorKind::CapacityExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (kind, message, details) = match self {
            AppError::Upload(UploadError::Rejected(result)) => {
                let result = *result;
                let message = result.message().to_string();
                (result.kind(), message, Some(result.details))
            }
            AppError::Upload(e) => (e.kind(), e.to_string(), None),
            AppError::BadRequest(msg) => (ErrorKind::ValidationError, msg, None),
            AppError::PayloadTooLarge(msg) => (ErrorKind::FileTooLarge, msg, None),
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    ErrorKind::ValidationError,
                    "Não foi possível processar a requisição".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": kind.code(),
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status_for(kind), Json(body)).into_response()
    }
}
