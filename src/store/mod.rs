//! Event Store - file-backed multi-tenant storage
//!
//! The store owns the on-disk layout and every mutation of it:
//! - `registry`: the list of events (`events.json`)
//! - `documents`: per-event configuration and subtitle documents
//! - `assets`: uploaded images under `assets/<event_id>/`
//! - `rename`: the identifier change transaction
//! - `backup`: raw export and validated restore of documents
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//! ├── events.json                    [{id, name}, ...]
//! ├── events/<id>/configuration.json
//! ├── events/<id>/subtitles.json
//! └── assets/<id>/<generated-file>
//! ```
//!
//! # Locking
//!
//! Mutations of one event hold that event's lock for their whole duration.
//! Registry read-modify-write holds the registry file lock. Locks are taken
//! in the order event(s) → registry → document file, so no two operations
//! can wait on each other. Every lock is also an exclusive file lock on a
//! sidecar `.lock` file, so processes sharing the data directory queue on
//! the same keys. Reads take no lock.

mod assets;
mod backup;
mod documents;
mod registry;
mod rename;

use std::fs;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    ConfigurationDocument, DocumentKind, Event, EventId, ImageField, Subtitle, UploadedFile,
};
use crate::utils::{cleanup_temp_files, LockTable, PathLock};

pub use assets::AssetOutcome;
pub use backup::Backup;

/// Handle to one data directory
pub struct EventStore {
    pub(crate) config: StoreConfig,
    pub(crate) locks: Arc<LockTable>,
}

impl EventStore {
    /// Open the store, creating the directory skeleton if needed
    ///
    /// Leftover temp files from interrupted writes are removed.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(config.events_dir())?;
        fs::create_dir_all(config.assets_dir())?;

        match cleanup_temp_files(config.data_dir()) {
            Ok(0) => {}
            Ok(n) => info!(count = n, "removed leftover temp files"),
            Err(e) => warn!(error = %e, "could not clean up temp files"),
        }

        let locks = LockTable::cross_process(config.lock_timeout);
        Ok(Self { config, locks })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Hold the event's mutation lock, failing if the event is unknown
    pub(crate) fn lock_event(&self, id: &EventId) -> StoreResult<PathLock> {
        let guard = self.locks.acquire(self.config.event_lock_key(id))?;
        self.require(id)?;
        Ok(guard)
    }

    /// NotFound unless `id` is in the registry
    pub(crate) fn require(&self, id: &EventId) -> StoreResult<()> {
        if registry::list(self).iter().any(|e| &e.id == id) {
            Ok(())
        } else {
            Err(StoreError::not_found(format!("event '{}' does not exist", id)))
        }
    }
}

// Registry operations (from registry.rs)
impl EventStore {
    pub fn list(&self) -> Vec<Event> {
        registry::list(self)
    }

    pub fn get(&self, id: &EventId) -> StoreResult<Event> {
        registry::get(self, id)
    }

    pub fn is_valid_id(&self, raw: &str) -> bool {
        registry::is_valid_id(self, raw)
    }

    pub fn create(&self, ctx: &RequestContext, name: &str) -> StoreResult<Event> {
        registry::create(self, ctx, name)
    }

    pub fn rename(&self, ctx: &RequestContext, id: &EventId, new_name: &str) -> StoreResult<Event> {
        registry::rename(self, ctx, id, new_name)
    }

    pub fn delete(&self, ctx: &RequestContext, id: &EventId) -> StoreResult<()> {
        registry::delete(self, ctx, id)
    }

    /// Make sure at least one event exists
    pub fn bootstrap(&self, ctx: &RequestContext) -> StoreResult<Option<Event>> {
        registry::bootstrap(self, ctx)
    }
}

// Document operations (from documents.rs)
impl EventStore {
    pub fn load_document(&self, id: &EventId) -> StoreResult<ConfigurationDocument> {
        self.require(id)?;
        documents::load(self, id)
    }

    pub fn save_document(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        doc: ConfigurationDocument,
    ) -> StoreResult<ConfigurationDocument> {
        documents::save(self, ctx, id, doc)
    }

    pub fn load_subtitles(&self, id: &EventId) -> StoreResult<Vec<Subtitle>> {
        self.require(id)?;
        documents::load_subtitles(self, id)
    }

    pub fn save_subtitles(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        subtitles: Vec<Subtitle>,
    ) -> StoreResult<Vec<Subtitle>> {
        documents::save_subtitles(self, ctx, id, subtitles)
    }
}

// Asset operations (from assets.rs)
impl EventStore {
    pub fn store_asset(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        field: ImageField,
        upload: Option<&UploadedFile>,
        previous_path: &str,
    ) -> StoreResult<AssetOutcome> {
        assets::store(self, ctx, id, field, upload, previous_path)
    }

    pub fn replace_image(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        field: ImageField,
        upload: &UploadedFile,
    ) -> StoreResult<ConfigurationDocument> {
        assets::replace_image(self, ctx, id, field, upload)
    }

    pub fn prune_orphans(&self, ctx: &RequestContext, id: &EventId) -> StoreResult<Vec<String>> {
        assets::prune_orphans(self, ctx, id)
    }
}

// Identifier change and backups (from rename.rs, backup.rs)
impl EventStore {
    pub fn change_id(&self, ctx: &RequestContext, current: &EventId, new_id: &EventId) -> StoreResult<Event> {
        rename::change_id(self, ctx, current, new_id)
    }

    pub fn export(&self, id: &EventId, kind: DocumentKind) -> StoreResult<Backup> {
        backup::export(self, id, kind)
    }

    pub fn restore(
        &self,
        ctx: &RequestContext,
        id: &EventId,
        kind: DocumentKind,
        bytes: &[u8],
    ) -> StoreResult<()> {
        backup::restore(self, ctx, id, kind, bytes)
    }
}
