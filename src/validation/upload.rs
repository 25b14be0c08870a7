//! Upload whitelist and size ceiling

use crate::error::{StoreError, StoreResult};
use crate::types::UploadedFile;

/// Largest accepted upload (5 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted MIME types with their known extensions; the first is canonical
pub const ALLOWED_IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("image/svg+xml", &["svg"]),
];

fn normalized_mime(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// Validate a declared upload and pick the extension to store it under
///
/// The original extension is kept when it belongs to the declared type,
/// otherwise the canonical extension of that type is used.
pub fn validate_upload(upload: &UploadedFile, max_bytes: u64) -> StoreResult<&'static str> {
    let mime = normalized_mime(&upload.mime_type);
    let (_, extensions) = ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .ok_or_else(|| {
            StoreError::validation(format!(
                "file type '{}' is not allowed; upload a JPEG, PNG, GIF, WebP or SVG image",
                upload.mime_type
            ))
        })?;

    if upload.size == 0 {
        return Err(StoreError::validation("the uploaded file is empty"));
    }
    if upload.size > max_bytes {
        return Err(StoreError::validation(format!(
            "file is {} bytes; the limit is {} MiB",
            upload.size,
            max_bytes / (1024 * 1024)
        )));
    }

    let original_ext = upload
        .original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    let extension = original_ext
        .and_then(|ext| extensions.iter().find(|known| **known == ext))
        .unwrap_or(&extensions[0]);

    Ok(*extension)
}
