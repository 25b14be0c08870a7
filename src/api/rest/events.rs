//! Event and document endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{path_event, ApiError, ApiResponse};
use crate::api::ApiState;
use crate::types::{ConfigurationDocument, Event, Subtitle};

/// GET /api/events - List events in registry order
pub async fn list_events(State(state): State<Arc<ApiState>>) -> Json<ApiResponse<Vec<Event>>> {
    let events = state.store.list();
    let total = events.len();
    Json(ApiResponse::with_total(events, total))
}

/// GET /api/events/:id/configuration
pub async fn get_configuration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConfigurationDocument>>, ApiError> {
    let id = path_event(&id)?;
    let doc = state.store.load_document(&id)?;
    Ok(Json(ApiResponse::new(doc)))
}

/// GET /api/events/:id/subtitles
pub async fn get_subtitles(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Subtitle>>>, ApiError> {
    let id = path_event(&id)?;
    let subtitles = state.store.load_subtitles(&id)?;
    let total = subtitles.len();
    Ok(Json(ApiResponse::with_total(subtitles, total)))
}
