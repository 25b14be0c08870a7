//! Request-scoped context
//!
//! The store keeps no per-session state. Whoever dispatches a request builds
//! a `RequestContext` and passes it into each mutating operation.

use crate::error::{StoreError, StoreResult};
use crate::types::EventId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Actor recorded in logs for mutations
    pub user: String,
    /// Event the caller is currently working on, if any
    pub active_event: Option<EventId>,
}

impl RequestContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            active_event: None,
        }
    }

    pub fn with_active_event(mut self, id: EventId) -> Self {
        self.active_event = Some(id);
        self
    }

    /// Pick the explicitly requested event, else the active one
    pub fn resolve_event(&self, explicit: Option<&str>) -> StoreResult<EventId> {
        match explicit {
            Some(raw) => EventId::parse(raw),
            None => self
                .active_event
                .clone()
                .ok_or_else(|| StoreError::validation("no event selected and no eventId given")),
        }
    }
}
