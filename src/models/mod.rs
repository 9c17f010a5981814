use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Image formats recognised by their leading signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Maps a lower-cased, dot-prefixed extension to its format family.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".png" => Some(Self::Png),
            ".jpg" | ".jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage flags of the validation chain. Stages that never ran keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub size_valid: bool,
    pub extension_valid: bool,
    pub format_valid: bool,
    pub signature_valid: bool,
    pub integrity_valid: bool,
    pub detected_format: Option<ImageFormat>,
    pub declared_extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_code: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub details: ValidationDetails,
}

impl ValidationResult {
    pub fn accepted(details: ValidationDetails) -> Self {
        Self {
            is_valid: true,
            error_code: None,
            error_message: None,
            details,
        }
    }

    pub fn rejected(kind: ErrorKind, message: impl Into<String>, details: ValidationDetails) -> Self {
        Self {
            is_valid: false,
            error_code: Some(kind),
            error_message: Some(message.into()),
            details,
        }
    }

    /// The rejection message, or an empty string for an accepted file.
    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }

    /// Kind of the failing stage. Accepted results report `ValidationError`,
    /// which only matters if a caller wraps an accepted result by mistake.
    pub fn kind(&self) -> ErrorKind {
        self.error_code.unwrap_or(ErrorKind::ValidationError)
    }
}

/// Lifecycle status of an upload session. Serialised with the user-facing labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SessionStatus {
    #[serde(rename = "nova")]
    New,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "concluida")]
    Completed,
    #[serde(rename = "erro")]
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "nova",
            Self::InProgress => "em_andamento",
            Self::Completed => "concluida",
            Self::Error => "erro",
        }
    }
}

/// The uploaded file held by a session. The session owns the buffer outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub buffer: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub session_id: Uuid,
    pub status: SessionStatus,
    /// `None` exactly when the session carries no file (always the case for `New`).
    pub file: Option<SessionFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadSession {
    /// An empty session, as produced by a reset.
    pub fn new(session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            status: SessionStatus::New,
            file: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A session holding a fully validated file.
    pub fn completed(session_id: Uuid, file: SessionFile, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            status: SessionStatus::Completed,
            file: Some(file),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Metadata view of a session, without the file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UploadSession> for SessionSummary {
    fn from(session: &UploadSession) -> Self {
        let file = session.file.as_ref();
        Self {
            session_id: session.session_id,
            status: session.status,
            file_name: file.map(|f| f.file_name.clone()),
            file_size: file.map(|f| f.file_size),
            mime_type: file.map(|f| f.mime_type.clone()),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
