//! Event registry (`events.json`)

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, info_span, warn};

use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::types::{ConfigurationDocument, DocumentKind, Event, EventId, Subtitle};
use crate::utils::{atomic_write, write_locked, PathLock};

use super::EventStore;

/// Longest accepted display name
pub const MAX_NAME_LEN: usize = 200;

/// Name given to the event created on first start
pub const DEFAULT_EVENT_NAME: &str = "Default event";

/// Current registry; absent or unreadable registries read as empty
pub fn list(store: &EventStore) -> Vec<Event> {
    match load_strict(&store.config.registry_path()) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "registry unreadable, listing no events");
            Vec::new()
        }
    }
}

pub fn get(store: &EventStore, id: &EventId) -> StoreResult<Event> {
    list(store)
        .into_iter()
        .find(|e| &e.id == id)
        .ok_or_else(|| StoreError::not_found(format!("event '{}' does not exist", id)))
}

/// Well-formed and registered
pub fn is_valid_id(store: &EventStore, raw: &str) -> bool {
    EventId::is_well_formed(raw) && list(store).iter().any(|e| e.id.as_str() == raw)
}

/// Strict load used by mutations: a malformed registry is an error, never overwritten
pub(crate) fn load_strict(path: &Path) -> StoreResult<Vec<Event>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("registry {} is malformed: {}", path.display(), e),
        ))
    })
}

pub(crate) fn persist(guard: &PathLock, events: &[Event]) -> StoreResult<()> {
    let content = serde_json::to_vec_pretty(events)?;
    write_locked(guard, &content)?;
    Ok(())
}

pub(crate) fn lock_registry(store: &EventStore) -> StoreResult<PathLock> {
    Ok(store.locks.acquire(store.config.registry_path())?)
}

fn clean_name(name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("event name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::validation(format!(
            "event name is longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Create an event with default documents
///
/// Documents are written before the registry entry is published, and removed
/// again if publishing fails, so a failed create leaves nothing discoverable.
pub fn create(store: &EventStore, ctx: &RequestContext, name: &str) -> StoreResult<Event> {
    let _span = info_span!("create_event", user = %ctx.user).entered();
    let name = clean_name(name)?;

    let guard = lock_registry(store)?;
    let mut events = load_strict(guard.key())?;

    let id = loop {
        let candidate = EventId::generate();
        let taken = events.iter().any(|e| e.id == candidate)
            || store.config.event_dir(&candidate).exists()
            || store.config.asset_dir(&candidate).exists();
        if !taken {
            break candidate;
        }
    };

    let event = Event::new(id.clone(), name);
    let published = write_initial_documents(store, &event).and_then(|_| {
        events.push(event.clone());
        persist(&guard, &events)
    });

    if let Err(e) = published {
        if let Err(cleanup) = fs::remove_dir_all(store.config.event_dir(&id)) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(event = %id, error = %cleanup, "could not remove documents of failed create");
            }
        }
        return Err(e);
    }

    info!(event = %event.id, name = %event.name, "event created");
    Ok(event)
}

fn write_initial_documents(store: &EventStore, event: &Event) -> StoreResult<()> {
    let doc = ConfigurationDocument::template(&event.name);
    let subtitles: Vec<Subtitle> = Vec::new();

    atomic_write(
        &store.locks,
        store.config.document_path(&event.id, DocumentKind::Configuration),
        &serde_json::to_vec_pretty(&doc)?,
    )?;
    atomic_write(
        &store.locks,
        store.config.document_path(&event.id, DocumentKind::Subtitles),
        &serde_json::to_vec_pretty(&subtitles)?,
    )?;
    Ok(())
}

/// Change an event's display name
pub fn rename(store: &EventStore, ctx: &RequestContext, id: &EventId, new_name: &str) -> StoreResult<Event> {
    let _span = info_span!("rename_event", user = %ctx.user, event = %id).entered();
    let new_name = clean_name(new_name)?;

    let guard = lock_registry(store)?;
    let mut events = load_strict(guard.key())?;

    let event = events
        .iter_mut()
        .find(|e| &e.id == id)
        .ok_or_else(|| StoreError::not_found(format!("event '{}' does not exist", id)))?;
    event.name = new_name;
    let renamed = event.clone();

    persist(&guard, &events)?;
    info!(name = %renamed.name, "event renamed");
    Ok(renamed)
}

/// Remove an event and, best effort, its documents and assets
pub fn delete(store: &EventStore, ctx: &RequestContext, id: &EventId) -> StoreResult<()> {
    let _span = info_span!("delete_event", user = %ctx.user, event = %id).entered();
    let _event_guard = store.lock_event(id)?;

    {
        let guard = lock_registry(store)?;
        let mut events = load_strict(guard.key())?;

        let position = events
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| StoreError::not_found(format!("event '{}' does not exist", id)))?;
        if events.len() == 1 {
            return Err(StoreError::conflict(format!(
                "cannot delete '{}': it is the only remaining event",
                id
            )));
        }

        events.remove(position);
        persist(&guard, &events)?;
    }

    // The registry entry is gone; leftover directories are only logged
    for dir in [store.config.event_dir(id), store.config.asset_dir(id)] {
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "could not remove directory of deleted event"),
        }
    }

    info!("event deleted");
    Ok(())
}

/// Create the default event when the registry is empty
pub fn bootstrap(store: &EventStore, ctx: &RequestContext) -> StoreResult<Option<Event>> {
    if !list(store).is_empty() {
        return Ok(None);
    }
    create(store, ctx, DEFAULT_EVENT_NAME).map(Some)
}
