//! Identifier change transaction
//!
//! Steps, each gated on the previous one:
//! 1. move `events/<current>` to `events/<new>`
//! 2. move `assets/<current>` to `assets/<new>`, undoing step 1 on failure
//! 3. rewrite `assets/<current>/` references in the configuration document
//! 4. update the registry entry
//!
//! Failures in steps 1-2 leave the store as it was. Failures in steps 3-4 are
//! not unwound and surface as `PartialFailure`.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use crate::context::RequestContext;
use crate::error::{RenameStep, StoreError, StoreResult};
use crate::types::{rebase_asset_paths, DocumentKind, Event, EventId};
use crate::utils::atomic_write;

use super::documents::read_raw;
use super::registry::{load_strict, lock_registry, persist};
use super::EventStore;

/// Change the id of `current` to `new_id`
pub fn change_id(
    store: &EventStore,
    ctx: &RequestContext,
    current: &EventId,
    new_id: &EventId,
) -> StoreResult<Event> {
    let _span = info_span!("change_event_id", user = %ctx.user, from = %current, to = %new_id).entered();

    if current == new_id {
        return super::registry::get(store, current);
    }
    store.require(current)?;

    let _guards = store.locks.acquire_many(&[
        store.config.event_lock_key(current),
        store.config.event_lock_key(new_id),
    ])?;

    // Re-check under the locks
    let events = super::registry::list(store);
    if !events.iter().any(|e| &e.id == current) {
        return Err(StoreError::not_found(format!("event '{}' does not exist", current)));
    }
    if events.iter().any(|e| &e.id == new_id) {
        return Err(StoreError::conflict(format!("event id '{}' is already in use", new_id)));
    }

    let old_docs = store.config.event_dir(current);
    let new_docs = store.config.event_dir(new_id);
    let old_assets = store.config.asset_dir(current);
    let new_assets = store.config.asset_dir(new_id);

    // Step 1
    let docs_moved = move_dir(&old_docs, &new_docs)?;

    // Step 2
    move_assets_or_undo(
        (old_docs.as_path(), new_docs.as_path()),
        (old_assets.as_path(), new_assets.as_path()),
        docs_moved,
        current,
        new_id,
    )?;

    // Step 3
    match rewrite_references(store, current, new_id) {
        Ok(changed) => info!(changed, "asset references rewritten"),
        Err(e) => {
            error!(error = %e, "asset references left stale after directory move");
            return Err(partial(current, new_id, RenameStep::RewriteReferences, e.to_string()));
        }
    }

    // Step 4
    let event = update_registry(store, current, new_id).map_err(|e| {
        error!(error = %e, "registry not updated after directory move");
        partial(current, new_id, RenameStep::UpdateRegistry, e.to_string())
    })?;

    info!("event id changed");
    Ok(event)
}

/// Move `from` to `to`; `false` if there was nothing to move
fn move_dir(from: &Path, to: &Path) -> StoreResult<bool> {
    if !from.exists() {
        return Ok(false);
    }
    if to.exists() {
        return Err(StoreError::conflict(format!(
            "cannot move {}: {} already exists",
            from.display(),
            to.display()
        )));
    }
    fs::rename(from, to)?;
    Ok(true)
}

/// Move the asset directory, putting the documents back if that fails
fn move_assets_or_undo(
    (old_docs, new_docs): (&Path, &Path),
    (old_assets, new_assets): (&Path, &Path),
    docs_moved: bool,
    current: &EventId,
    new_id: &EventId,
) -> StoreResult<()> {
    let Err(e) = move_dir(old_assets, new_assets) else {
        return Ok(());
    };
    if docs_moved {
        if let Err(rollback) = fs::rename(new_docs, old_docs) {
            error!(error = %rollback, "could not move document directory back");
            return Err(partial(current, new_id, RenameStep::MoveAssets, format!(
                "{}; rolling back the document directory also failed: {}",
                e, rollback
            )));
        }
    }
    warn!(error = %e, "asset directory move failed, rename rolled back");
    Err(e)
}

/// Rebase references in the moved configuration document
///
/// Only the path values change; the rest of the file keeps its bytes. A
/// malformed or missing document has nothing to rewrite.
fn rewrite_references(store: &EventStore, from: &EventId, to: &EventId) -> StoreResult<usize> {
    let path = store.config.document_path(to, DocumentKind::Configuration);
    let Some(bytes) = read_raw(&path)? else {
        return Ok(0);
    };
    let mut value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "configuration is malformed, references not rewritten");
            return Ok(0);
        }
    };

    let changes = rebase_asset_paths(&mut value, from, to);
    if changes.is_empty() {
        return Ok(0);
    }

    let content = match splice_paths(&bytes, &changes) {
        Some(spliced) if serde_json::from_slice::<Value>(&spliced).ok().as_ref() == Some(&value) => spliced,
        _ => {
            debug!("path literals not found verbatim, rewriting the whole document");
            serde_json::to_vec_pretty(&value)?
        }
    };
    atomic_write(&store.locks, &path, &content)?;
    Ok(changes.len())
}

/// Swap each old path literal for the new one in the raw text
///
/// The caller checks the result parses to the expected value.
fn splice_paths(bytes: &[u8], changes: &[(String, String)]) -> Option<Vec<u8>> {
    let mut text = std::str::from_utf8(bytes).ok()?.to_string();
    for (old, new) in changes {
        let old = serde_json::to_string(old).ok()?;
        let new = serde_json::to_string(new).ok()?;
        if !text.contains(&old) {
            return None;
        }
        text = text.replacen(&old, &new, 1);
    }
    Some(text.into_bytes())
}

fn update_registry(store: &EventStore, from: &EventId, to: &EventId) -> StoreResult<Event> {
    let guard = lock_registry(store)?;
    let mut events = load_strict(guard.key())?;

    let event = events.iter_mut().find(|e| &e.id == from).ok_or_else(|| {
        StoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("registry entry '{}' disappeared during rename", from),
        ))
    })?;
    event.id = to.clone();
    let updated = event.clone();

    persist(&guard, &events)?;
    Ok(updated)
}

fn partial(from: &EventId, to: &EventId, step: RenameStep, message: String) -> StoreError {
    StoreError::PartialFailure {
        from: from.to_string(),
        to: to.to_string(),
        step,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::ErrorKind;
    use std::thread;
    use std::time::Duration;

    fn id(raw: &str) -> EventId {
        EventId::parse(raw).unwrap()
    }

    fn seed_logo(store: &EventStore, event: &EventId) {
        let dir = store.config().asset_dir(event);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("logo.png"), b"png").unwrap();

        let mut doc = store.load_document(event).unwrap();
        doc.logo = format!("assets/{}/logo.png", event);
        store.save_document(&ctx(), event, doc).unwrap();
    }

    #[test]
    fn test_change_id_moves_everything() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        seed_logo(&store, &event.id);
        let new_id = id("demo2");

        let renamed = store.change_id(&ctx(), &event.id, &new_id).unwrap();

        assert_eq!(renamed, Event::new(new_id.clone(), "Demo"));
        assert_eq!(store.list(), vec![renamed]);
        assert_eq!(store.load_document(&new_id).unwrap().logo, "assets/demo2/logo.png");
        assert!(store.config().asset_dir(&new_id).join("logo.png").is_file());
        assert!(!store.config().asset_dir(&event.id).exists());
        assert!(!store.config().event_dir(&event.id).exists());
    }

    #[test]
    fn test_same_id_is_a_noop() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        assert_eq!(store.change_id(&ctx(), &event.id, &event.id).unwrap(), event);
    }

    #[test]
    fn test_taken_id_is_a_conflict() {
        let (store, _dir) = create_test_store();
        let a = store.create(&ctx(), "A").unwrap();
        let b = store.create(&ctx(), "B").unwrap();

        let err = store.change_id(&ctx(), &a.id, &b.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(store.config().event_dir(&a.id).is_dir());
    }

    #[test]
    fn test_unknown_source_is_not_found() {
        let (store, _dir) = create_test_store();
        store.create(&ctx(), "A").unwrap();
        let err = store.change_id(&ctx(), &id("ghost"), &id("other")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_asset_move_failure_rolls_back_documents() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        seed_logo(&store, &event.id);
        let new_id = id("demo2");

        let stray = store.config().asset_dir(&new_id);
        fs::create_dir_all(&stray).unwrap();
        fs::write(stray.join("keep.txt"), b"stray").unwrap();

        let err = store.change_id(&ctx(), &event.id, &new_id).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::PartialFailure);

        assert!(store.config().event_dir(&event.id).is_dir());
        assert!(!store.config().event_dir(&new_id).exists());
        assert!(store.config().asset_dir(&event.id).join("logo.png").is_file());
        assert_eq!(store.list()[0].id, event.id);
        assert_eq!(
            store.load_document(&event.id).unwrap().logo,
            format!("assets/{}/logo.png", event.id)
        );
    }

    #[test]
    fn test_registry_failure_is_partial() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let new_id = id("demo2");
        let registry = store.config().registry_path();

        // Hold the registry so the rename stops right before step 4
        let registry_guard = store.locks.acquire(&registry).unwrap();
        let result = thread::scope(|s| {
            let worker = s.spawn(|| store.change_id(&ctx(), &event.id, &new_id));
            while !store.config().event_dir(&new_id).exists() {
                thread::sleep(Duration::from_millis(5));
            }
            fs::write(&registry, b"{broken").unwrap();
            drop(registry_guard);
            worker.join().unwrap()
        });

        match result.unwrap_err() {
            StoreError::PartialFailure { step, .. } => assert_eq!(step, RenameStep::UpdateRegistry),
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert!(store.config().event_dir(&new_id).is_dir());
        assert!(!store.config().event_dir(&event.id).exists());
    }

    #[test]
    fn test_round_trip_keeps_restored_bytes() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let raw = format!(
            r#"{{"title":"T","logo":"assets/{}/l.png","extra":1,"socials":{{"social3":{{"icon":"assets/{}/s.svg"}}}}}}"#,
            event.id, event.id
        );
        store
            .restore(&ctx(), &event.id, DocumentKind::Configuration, raw.as_bytes())
            .unwrap();

        let other = id("bbb");
        store.change_id(&ctx(), &event.id, &other).unwrap();
        let moved = fs::read_to_string(store.config().document_path(&other, DocumentKind::Configuration)).unwrap();
        assert_eq!(
            moved,
            r#"{"title":"T","logo":"assets/bbb/l.png","extra":1,"socials":{"social3":{"icon":"assets/bbb/s.svg"}}}"#
        );

        store.change_id(&ctx(), &other, &event.id).unwrap();
        let back = fs::read(store.config().document_path(&event.id, DocumentKind::Configuration)).unwrap();
        assert_eq!(back, raw.into_bytes());
    }

    #[test]
    fn test_escaped_paths_are_still_rewritten() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let raw = format!(r#"{{"logo":"assets\/{}\/l.png","extra":true}}"#, event.id);
        store
            .restore(&ctx(), &event.id, DocumentKind::Configuration, raw.as_bytes())
            .unwrap();

        let other = id("bbb");
        store.change_id(&ctx(), &event.id, &other).unwrap();

        let path = store.config().document_path(&other, DocumentKind::Configuration);
        let value: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(value["logo"], "assets/bbb/l.png");
        assert_eq!(value["extra"], true);
    }

    #[test]
    fn test_unreadable_configuration_is_partial_at_rewrite() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let new_id = id("demo2");

        // A directory where the document should be cannot be read as bytes
        let doc_path = store.config().document_path(&event.id, DocumentKind::Configuration);
        fs::remove_file(&doc_path).unwrap();
        fs::create_dir(&doc_path).unwrap();

        let err = store.change_id(&ctx(), &event.id, &new_id).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.kind().as_str(), "PartialFailureError");
        match err {
            StoreError::PartialFailure { step, .. } => assert_eq!(step, RenameStep::RewriteReferences),
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert!(store.config().event_dir(&new_id).is_dir());
        assert!(!store.config().event_dir(&event.id).exists());
        assert_eq!(store.list()[0].id, event.id);
    }

    #[test]
    fn test_failed_undo_of_document_move_is_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        // The old document location has lost its parent, so moving back fails
        let old_docs = root.join("gone").join("a");
        let new_docs = root.join("events-b");
        let old_assets = root.join("assets-a");
        let new_assets = root.join("assets-b");
        for existing in [&new_docs, &old_assets, &new_assets] {
            fs::create_dir_all(existing).unwrap();
        }
        fs::write(new_docs.join("configuration.json"), b"{}").unwrap();

        let err = move_assets_or_undo(
            (old_docs.as_path(), new_docs.as_path()),
            (old_assets.as_path(), new_assets.as_path()),
            true,
            &id("a"),
            &id("b"),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.kind().as_str(), "PartialFailureError");
        match err {
            StoreError::PartialFailure { step, message, .. } => {
                assert_eq!(step, RenameStep::MoveAssets);
                assert!(message.contains("rolling back"), "{message}");
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert!(new_docs.join("configuration.json").is_file());
        assert!(old_assets.is_dir());
    }

    #[test]
    fn test_failed_asset_move_with_undo_is_not_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        let old_docs = root.join("events-a");
        let new_docs = root.join("events-b");
        let old_assets = root.join("assets-a");
        let new_assets = root.join("assets-b");
        for existing in [&new_docs, &old_assets, &new_assets] {
            fs::create_dir_all(existing).unwrap();
        }

        let err = move_assets_or_undo(
            (old_docs.as_path(), new_docs.as_path()),
            (old_assets.as_path(), new_assets.as_path()),
            true,
            &id("a"),
            &id("b"),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(old_docs.is_dir());
        assert!(!new_docs.exists());
    }
}
