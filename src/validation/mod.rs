//! Input validation for uploads and documents

mod document;
mod upload;

pub use document::{is_hex_color, validate_document, MAX_INTERVAL_SECS};
pub use upload::{validate_upload, ALLOWED_IMAGE_TYPES, MAX_UPLOAD_BYTES};
