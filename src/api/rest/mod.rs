//! REST endpoints
//!
//! - `GET /api/events` - Registry in order
//! - `GET /api/events/:id/configuration` - Merged configuration document
//! - `GET /api/events/:id/subtitles` - Subtitle list
//! - `GET /api/events/:id/backup/:kind` - Raw document download

pub mod backup;
pub mod events;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ErrorKind, StoreError};
use crate::types::EventId;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    /// Total count for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, total: None }
    }

    pub fn with_total(data: T, total: usize) -> Self {
        Self {
            data,
            total: Some(total),
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub kind: ErrorKind,
    #[serde(skip)]
    pub status: StatusCode,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let kind = e.kind();
        let (status, code) = match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Io | ErrorKind::PartialFailure => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        Self {
            error: e.to_string(),
            code: code.to_string(),
            kind,
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Parse the `:id` path segment
pub(crate) fn path_event(raw: &str) -> Result<EventId, ApiError> {
    EventId::parse(raw).map_err(ApiError::from)
}
