//! Backup download endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::{path_event, ApiError};
use crate::api::ApiState;
use crate::types::DocumentKind;

/// GET /api/events/:id/backup/:kind - Raw document bytes as an attachment
pub async fn download_backup(
    State(state): State<Arc<ApiState>>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let id = path_event(&id)?;
    let kind = DocumentKind::parse(&kind)?;
    let backup = state.store.export(&id, kind)?;

    let disposition = format!("attachment; filename=\"{}\"", backup.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, backup.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        backup.bytes,
    )
        .into_response())
}
