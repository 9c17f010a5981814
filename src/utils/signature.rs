use crate::models::ImageFormat;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
pub const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// IEND chunk type followed by its fixed CRC.
pub const PNG_TRAILER: [u8; 8] = [0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82];
/// JPEG end-of-image marker.
pub const JPEG_TRAILER: [u8; 2] = [0xFF, 0xD9];

/// Buffers shorter than this are never classified.
pub const MIN_HEADER_LEN: usize = 12;

/// Classifies a buffer by its leading magic bytes, ignoring any declared
/// name or MIME type. `None` means no supported signature matched.
pub fn detect(buffer: &[u8]) -> Option<ImageFormat> {
    if buffer.len() < MIN_HEADER_LEN {
        return None;
    }

    if buffer.starts_with(&PNG_SIGNATURE) {
        return Some(ImageFormat::Png);
    }

    if buffer.starts_with(&JPEG_SIGNATURE) {
        return Some(ImageFormat::Jpeg);
    }

    None
}

/// Checks the format-specific terminator at the end of the buffer.
pub fn has_valid_trailer(buffer: &[u8], format: ImageFormat) -> bool {
    match format {
        ImageFormat::Png => buffer.ends_with(&PNG_TRAILER),
        ImageFormat::Jpeg => buffer.ends_with(&JPEG_TRAILER),
    }
}
