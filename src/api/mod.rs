//! Read-only HTTP API for the public viewer and backup downloads

pub mod http;
pub mod rest;

use std::sync::Arc;

use crate::store::EventStore;

pub use http::create_router;

/// Shared state of the HTTP handlers
pub struct ApiState {
    pub store: Arc<EventStore>,
}

impl ApiState {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}
