use crate::error::ErrorKind;
use crate::models::{ImageFormat, ValidationDetails, ValidationResult};
use crate::utils::signature;

/// Maximum file size: 15 MB
pub const MAX_FILE_SIZE: u64 = 15 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// `image/jpg` is not registered but browsers still send it.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

/// Checks of the validation chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Size,
    Extension,
    MimeType,
    Signature,
    Integrity,
}

const STAGES: [Stage; 5] = [
    Stage::Size,
    Stage::Extension,
    Stage::MimeType,
    Stage::Signature,
    Stage::Integrity,
];

#[derive(Debug)]
struct StageFailure {
    kind: ErrorKind,
    message: String,
}

impl StageFailure {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

type StageResult = Result<(), StageFailure>;

struct Candidate<'a> {
    file_name: &'a str,
    file_size: u64,
    mime_type: &'a str,
    buffer: &'a [u8],
}

/// Runs the ordered validation chain for an uploaded image. Stateless apart
/// from its limit, so one instance can be shared freely across requests.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl FileValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Validates a file: size, extension, MIME type, signature, integrity.
    /// The first failing stage decides the result; later stages never run
    /// and their flags stay `false`.
    pub fn validate(
        &self,
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        buffer: &[u8],
    ) -> ValidationResult {
        let candidate = Candidate {
            file_name,
            file_size,
            mime_type,
            buffer,
        };
        let mut details = ValidationDetails::default();

        for stage in STAGES {
            let outcome = match stage {
                Stage::Size => self.check_size(&candidate, &mut details),
                Stage::Extension => check_extension(&candidate, &mut details),
                Stage::MimeType => check_mime_type(&candidate, &mut details),
                Stage::Signature => check_signature(&candidate, &mut details),
                Stage::Integrity => check_integrity(&candidate, &mut details),
            };

            if let Err(failure) = outcome {
                return ValidationResult::rejected(failure.kind, failure.message, details);
            }
        }

        ValidationResult::accepted(details)
    }

    fn check_size(&self, candidate: &Candidate<'_>, details: &mut ValidationDetails) -> StageResult {
        if candidate.file_size < 1 {
            return Err(StageFailure::new(
                ErrorKind::CorruptedFile,
                "O arquivo está vazio ou corrompido",
            ));
        }

        if candidate.file_size > self.max_file_size {
            return Err(StageFailure::new(
                ErrorKind::FileTooLarge,
                format!(
                    "O arquivo tem {} bytes e excede o limite de {} MB",
                    candidate.file_size,
                    self.max_file_size / 1024 / 1024
                ),
            ));
        }

        details.size_valid = true;
        Ok(())
    }
}

/// Extension including the dot, lower-cased. `None` when the name has no dot.
pub fn declared_extension(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
}

fn check_extension(candidate: &Candidate<'_>, details: &mut ValidationDetails) -> StageResult {
    let extension = declared_extension(candidate.file_name);
    details.declared_extension = extension.clone();

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {
            details.extension_valid = true;
            Ok(())
        }
        Some(ext) => Err(StageFailure::new(
            ErrorKind::InvalidExtension,
            format!("A extensão '{}' não é permitida. Use .png, .jpg ou .jpeg", ext),
        )),
        None => Err(StageFailure::new(
            ErrorKind::InvalidExtension,
            "O arquivo não possui extensão. Use .png, .jpg ou .jpeg",
        )),
    }
}

fn check_mime_type(candidate: &Candidate<'_>, details: &mut ValidationDetails) -> StageResult {
    if !validate_mime_type(candidate.mime_type) {
        return Err(StageFailure::new(
            ErrorKind::InvalidFormat,
            format!(
                "O tipo de arquivo '{}' não é permitido. Envie uma imagem PNG ou JPEG",
                candidate.mime_type
            ),
        ));
    }

    details.format_valid = true;
    Ok(())
}

fn check_signature(candidate: &Candidate<'_>, details: &mut ValidationDetails) -> StageResult {
    let Some(detected) = signature::detect(candidate.buffer) else {
        return Err(StageFailure::new(
            ErrorKind::NotAnImage,
            "O conteúdo do arquivo não corresponde a uma imagem PNG ou JPEG",
        ));
    };
    details.detected_format = Some(detected);

    let declared = details
        .declared_extension
        .as_deref()
        .and_then(ImageFormat::from_extension);

    if declared != Some(detected) {
        return Err(StageFailure::new(
            ErrorKind::InvalidFormat,
            format!(
                "O conteúdo do arquivo ({}) não corresponde à extensão {}",
                detected,
                details.declared_extension.as_deref().unwrap_or_default()
            ),
        ));
    }

    details.signature_valid = true;
    Ok(())
}

fn check_integrity(candidate: &Candidate<'_>, details: &mut ValidationDetails) -> StageResult {
    let intact = details
        .detected_format
        .is_some_and(|format| signature::has_valid_trailer(candidate.buffer, format));

    if !intact {
        return Err(StageFailure::new(
            ErrorKind::CorruptedFile,
            "O arquivo está corrompido ou incompleto",
        ));
    }

    details.integrity_valid = true;
    Ok(())
}

/// Validates a declared MIME type against the image allowlist.
/// The match is exact: no case folding, no parameters.
pub fn validate_mime_type(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}
