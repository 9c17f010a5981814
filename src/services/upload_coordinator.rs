use crate::error::UploadError;
use crate::models::{SessionFile, SessionStatus, UploadSession, ValidationResult};
use crate::services::session_store::SessionStore;
use crate::utils::validation::FileValidator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A single uploaded file as handed over by the HTTP layer.
#[derive(Debug, Validate)]
pub struct CreateUploadRequest {
    #[validate(length(min = 1, max = 255, message = "Nome de arquivo inválido"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "Tipo de arquivo ausente"))]
    pub mime_type: String,
    pub file_size: u64,
    pub file_buffer: Vec<u8>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub status: SessionStatus,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetSessionResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub message: String,
}

/// Drives the session state machine: validates first, then touches the store.
pub struct UploadCoordinator {
    validator: FileValidator,
    store: Arc<SessionStore>,
}

impl UploadCoordinator {
    pub fn new(validator: FileValidator, store: Arc<SessionStore>) -> Self {
        Self { validator, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn create_upload(
        &self,
        req: CreateUploadRequest,
    ) -> Result<CreateUploadResponse, UploadError> {
        let requested_id = req
            .session_id
            .as_deref()
            .map(parse_session_id)
            .transpose()?;
        req.validate()?;

        let result = self.validator.validate(
            &req.file_name,
            req.file_size,
            &req.mime_type,
            &req.file_buffer,
        );
        if !result.is_valid {
            tracing::warn!(
                file_name = %req.file_name,
                code = %result.kind(),
                "Upload rejected by validation"
            );
            return Err(result.into());
        }

        if let Some(id) = requested_id {
            if !self.store.exists(&id) {
                return Err(UploadError::session_not_found());
            }
        }

        let session_id = requested_id.unwrap_or_else(Uuid::new_v4);
        let file = SessionFile {
            file_name: req.file_name,
            file_size: req.file_size,
            mime_type: req.mime_type,
            buffer: req.file_buffer,
        };
        let now = Utc::now();

        // Status check and write share the store's critical section.
        let summary = self.store.upsert_with(session_id, |existing| match existing {
            Some(session) if session.is_completed() => {
                tracing::warn!(%session_id, "Upload into completed session refused");
                Err(UploadError::SessionLimitReached(
                    "Esta sessão já possui um arquivo enviado. Reinicie a sessão para enviar outro"
                        .to_string(),
                ))
            }
            None if requested_id.is_some() => Err(UploadError::session_not_found()),
            _ => Ok(UploadSession::completed(session_id, file, now)),
        })?;

        tracing::info!(
            %session_id,
            file_name = summary.file_name.as_deref().unwrap_or_default(),
            file_size = summary.file_size.unwrap_or_default(),
            "Upload completed"
        );

        Ok(CreateUploadResponse {
            session_id: summary.session_id,
            file_name: summary.file_name.unwrap_or_default(),
            file_size: summary.file_size.unwrap_or_default(),
            mime_type: summary.mime_type.unwrap_or_default(),
            status: summary.status,
            uploaded_at: summary.updated_at,
        })
    }

    pub fn get_session(&self, raw_id: &str) -> Result<SessionResponse, UploadError> {
        let id = parse_session_id(raw_id)?;
        let summary = self
            .store
            .summary(&id)
            .ok_or_else(UploadError::session_not_found)?;

        Ok(SessionResponse {
            session_id: summary.session_id,
            status: summary.status,
            file_name: summary.file_name,
            file_size: summary.file_size,
            created_at: summary.created_at,
        })
    }

    /// Drops the session and starts an empty one under a fresh id.
    pub fn reset_session(&self, raw_id: &str) -> Result<ResetSessionResponse, UploadError> {
        let old_id = parse_session_id(raw_id)?;

        let summary = self
            .store
            .replace(&old_id, UploadSession::new(old_id, Utc::now()))?;

        tracing::info!(old_session_id = %old_id, session_id = %summary.session_id, "Session reset");

        Ok(ResetSessionResponse {
            session_id: summary.session_id,
            status: summary.status,
            message: "Sessão reiniciada. Você já pode enviar um novo arquivo".to_string(),
        })
    }

    /// Runs the validation chain without creating or touching any session.
    pub fn validate_only(
        &self,
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        buffer: &[u8],
    ) -> ValidationResult {
        self.validator
            .validate(file_name, file_size, mime_type, buffer)
    }

    /// Copy of the file held by a completed session.
    pub fn download(&self, raw_id: &str) -> Result<SessionFile, UploadError> {
        let id = parse_session_id(raw_id)?;
        self.store
            .read(&id, |session| {
                session
                    .file
                    .as_ref()
                    .filter(|_| session.is_completed())
                    .cloned()
            })
            .flatten()
            .ok_or_else(|| UploadError::NotFound("Nenhum arquivo encontrado para esta sessão".to_string()))
    }
}

/// Session ids coming from outside must be well-formed UUIDs.
pub fn parse_session_id(raw: &str) -> Result<Uuid, UploadError> {
    Uuid::parse_str(raw)
        .map_err(|_| UploadError::Validation(format!("Identificador de sessão inválido: '{}'", raw)))
}
