use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::ValidationResult;

/// Stable error identifiers. The message text may change, these never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    FileTooLarge,
    InvalidExtension,
    InvalidFormat,
    NotAnImage,
    CorruptedFile,
    SessionLimitReached,
    CapacityExceeded,
    NotFound,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::InvalidExtension => "INVALID_EXTENSION",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::NotAnImage => "NOT_AN_IMAGE",
            Self::CorruptedFile => "CORRUPTED_FILE",
            Self::SessionLimitReached => "SESSION_LIMIT_REACHED",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Failures of the upload core. None of them is retried internally and none
/// leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Malformed input: bad session id, missing file, empty file name.
    #[error("{0}")]
    Validation(String),

    /// The validation chain rejected the file; carries the per-stage details.
    #[error("{}", .0.message())]
    Rejected(Box<ValidationResult>),

    #[error("{0}")]
    SessionLimitReached(String),

    #[error("{0}")]
    CapacityExceeded(String),

    #[error("{0}")]
    NotFound(String),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Rejected(result) => result.kind(),
            Self::SessionLimitReached(_) => ErrorKind::SessionLimitReached,
            Self::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn session_not_found() -> Self {
        Self::NotFound("Sessão não encontrada".to_string())
    }
}

impl From<ValidationResult> for UploadError {
    fn from(result: ValidationResult) -> Self {
        Self::Rejected(Box::new(result))
    }
}

impl From<validator::ValidationErrors> for UploadError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(format!("Dados de envio inválidos: {}", errors))
    }
}
