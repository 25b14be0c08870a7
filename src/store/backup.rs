//! Raw export and JSON-checked restore of per-event documents

use serde::Serialize;
use tracing::{info, info_span};

use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::types::{DocumentKind, EventId};
use crate::utils::atomic_write;

use super::documents::read_raw;
use super::EventStore;

/// Downloadable copy of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Backup {
    /// Suggested download name, `<id>_<kind>_backup.json`
    pub fn file_name_for(id: &EventId, kind: DocumentKind) -> String {
        format!("{}_{}_backup.json", id, kind)
    }

    /// Content as text, when the stored bytes are UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Bytes of the stored document exactly as on disk
pub fn export(store: &EventStore, id: &EventId, kind: DocumentKind) -> StoreResult<Backup> {
    store.require(id)?;

    let bytes = read_raw(&store.config.document_path(id, kind))?
        .ok_or_else(|| StoreError::not_found(format!("event '{}' has no {} document", id, kind)))?;

    Ok(Backup {
        file_name: Backup::file_name_for(id, kind),
        content_type: "application/json",
        bytes,
    })
}

/// Replace a document wholesale with `bytes` if they are well-formed JSON
///
/// No shape check beyond JSON syntax is applied; this is the recovery path.
pub fn restore(
    store: &EventStore,
    ctx: &RequestContext,
    id: &EventId,
    kind: DocumentKind,
    bytes: &[u8],
) -> StoreResult<()> {
    let _span = info_span!("restore_backup", user = %ctx.user, event = %id, kind = %kind).entered();
    store.require(id)?;

    if let Err(e) = serde_json::from_slice::<serde_json::Value>(bytes) {
        return Err(StoreError::validation(format!("backup is not valid JSON: {}", e)));
    }

    let _guard = store.lock_event(id)?;
    atomic_write(&store.locks, store.config.document_path(id, kind), bytes)?;

    info!(bytes = bytes.len(), "document restored");
    Ok(())
}
