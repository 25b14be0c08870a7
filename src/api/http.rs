//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{backup, events};
use super::ApiState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<ApiState>) -> Router {
    // Viewer pages are served from other origins; the API is read-only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/events", get(events::list_events))
        .route("/api/events/:id/configuration", get(events::get_configuration))
        .route("/api/events/:id/subtitles", get(events::get_subtitles))
        .route("/api/events/:id/backup/:kind", get(backup::download_backup))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::context::RequestContext;
    use crate::store::EventStore;
    use crate::types::Subtitle;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    fn setup() -> (Router, Arc<EventStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(EventStore::open(StoreConfig::new(dir.path())).unwrap());
        let app = create_router(Arc::new(ApiState::new(store.clone())));
        (app, store, dir)
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _store, _dir) = setup();
        let (status, _, body) = fetch(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_list_and_read_documents() {
        let (app, store, _dir) = setup();
        let ctx = RequestContext::new("tester");
        let event = store.create(&ctx, "Launch").unwrap();
        store
            .save_subtitles(&ctx, &event.id, vec![Subtitle::new("Welcome", "")])
            .unwrap();

        let (status, _, body) = fetch(app.clone(), "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["data"][0]["name"], "Launch");

        let uri = format!("/api/events/{}/configuration", event.id);
        let (status, _, body) = fetch(app.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["title"], "Launch");
        assert_eq!(json["data"]["colors"]["primary"], "#1e88e5");

        let uri = format!("/api/events/{}/subtitles", event.id);
        let (_, _, body) = fetch(app, &uri).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"][0]["text"], "Welcome");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (app, store, _dir) = setup();
        store.create(&RequestContext::new("tester"), "Launch").unwrap();

        let (status, _, body) = fetch(app.clone(), "/api/events/ghost/configuration").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "NotFoundError");

        let (status, _, _) = fetch(app, "/api/events/bad-id/subtitles").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backup_download_is_attachment() {
        let (app, store, _dir) = setup();
        let event = store.create(&RequestContext::new("tester"), "Launch").unwrap();
        let path = store
            .config()
            .document_path(&event.id, crate::types::DocumentKind::Configuration);

        let uri = format!("/api/events/{}/backup/configuration", event.id);
        let (status, headers, body) = fetch(app.clone(), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, std::fs::read(path).unwrap());
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"{}_configuration_backup.json\"", event.id).as_str()
        );

        let uri = format!("/api/events/{}/backup/secrets", event.id);
        let (status, _, _) = fetch(app, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
