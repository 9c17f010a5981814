use std::env;

use crate::services::session_store::DEFAULT_MAX_SESSIONS;
use crate::utils::validation::MAX_FILE_SIZE;

/// Headroom on top of the file limit for multipart boundaries and text fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Configuration for the upload service
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default: 15 MB)
    pub max_file_size: u64,

    /// Maximum number of sessions held at once (default: 100)
    pub max_sessions: usize,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            max_sessions: DEFAULT_MAX_SESSIONS,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_sessions: env::var("MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_sessions),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (wide-open CORS)
    pub fn development() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            ..Self::default()
        }
    }

    /// Request body ceiling applied by the HTTP layer.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}
