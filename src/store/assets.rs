//! Asset manager: upload validation, storage and supersession

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::types::{AssetRef, ConfigurationDocument, EventId, ImageField, UploadedFile};
use crate::utils::file_stamp;
use crate::validation::validate_upload;

use super::{documents, EventStore};

/// Result of storing an upload
///
/// On error `path` is the unchanged previous path and the caller must not
/// apply it as a new value.
#[derive(Debug)]
pub struct AssetOutcome {
    pub path: String,
    pub error: Option<StoreError>,
}

impl AssetOutcome {
    fn unchanged(previous: &str, error: Option<StoreError>) -> Self {
        Self {
            path: previous.to_string(),
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Store an upload for `field` and supersede `previous_path`
pub fn store(
    store: &EventStore,
    ctx: &RequestContext,
    id: &EventId,
    field: ImageField,
    upload: Option<&UploadedFile>,
    previous_path: &str,
) -> StoreResult<AssetOutcome> {
    let _span = info_span!("store_asset", user = %ctx.user, event = %id, field = field.key()).entered();
    let _guard = store.lock_event(id)?;

    let outcome = store_locked(store, id, field, upload, previous_path);
    if outcome.is_ok() {
        supersede(store, id, previous_path, &outcome.path);
    }
    Ok(outcome)
}

/// Validate and move the upload into the event's asset directory
///
/// Nothing is deleted here; the previous file stays until the caller has
/// committed the new path.
pub(crate) fn store_locked(
    store: &EventStore,
    id: &EventId,
    field: ImageField,
    upload: Option<&UploadedFile>,
    previous_path: &str,
) -> AssetOutcome {
    let Some(upload) = upload else {
        return AssetOutcome::unchanged(previous_path, None);
    };

    match place_upload(store, id, field, upload) {
        Ok(asset) => {
            info!(path = %asset, "asset stored");
            AssetOutcome {
                path: asset.to_string(),
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "upload rejected");
            AssetOutcome::unchanged(previous_path, Some(e))
        }
    }
}

fn place_upload(
    store: &EventStore,
    id: &EventId,
    field: ImageField,
    upload: &UploadedFile,
) -> StoreResult<AssetRef> {
    let extension = validate_upload(upload, store.config.max_upload_bytes)?;

    let token = Uuid::new_v4().simple().to_string();
    let file_name = format!("{}_{}_{}.{}", field.file_stem(), file_stamp(), &token[..8], extension);
    let asset = AssetRef::stored(id, file_name)?;
    let Some(dest) = store.config.resolve_asset(&asset) else {
        return Err(StoreError::validation("generated asset path is not store-relative"));
    };

    fs::create_dir_all(store.config.asset_dir(id))?;
    move_file(&upload.temp_path, &dest)?;

    if !dest.is_file() {
        return Err(StoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("stored asset {} is missing after the move", dest.display()),
        )));
    }
    Ok(asset)
}

/// Rename, or copy and remove when the source is on another filesystem
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if from.is_file() => {
            debug!(error = %e, "rename failed, copying upload instead");
            fs::copy(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                warn!(path = %from.display(), error = %e, "could not remove upload source after copy");
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Delete the file behind `previous` once `current` is committed
///
/// Only stored references owned by `id` are deleted. Failures are logged.
pub(crate) fn supersede(store: &EventStore, id: &EventId, previous: &str, current: &str) {
    if previous.trim() == current.trim() {
        return;
    }
    let asset = match AssetRef::parse_owned(previous, id) {
        Ok(asset) if asset.is_stored() => asset,
        _ => return,
    };
    let Some(path) = store.config.resolve_asset(&asset) else {
        return;
    };

    match fs::remove_file(&path) {
        Ok(()) => info!(path = %asset, "superseded asset deleted"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %asset, error = %e, "could not delete superseded asset"),
    }
}

/// Delete stored files that `before` referenced and `after` no longer does
///
/// Runs after `after` is committed. A file still named by another field of
/// `after` is kept.
pub(crate) fn release_replaced(
    store: &EventStore,
    id: &EventId,
    before: &ConfigurationDocument,
    after: &ConfigurationDocument,
) {
    let still_referenced = after.referenced_files(id);
    for (field, previous) in before.image_fields() {
        let current = after.image(field);
        let kept = match AssetRef::parse(previous) {
            Ok(AssetRef::Stored { file, .. }) => still_referenced.contains(&file),
            _ => false,
        };
        if !kept {
            supersede(store, id, previous, current);
        }
    }
}

/// Upload an image straight into a document field
///
/// The new file is confirmed in place and the document saved before the
/// previous file is deleted by the save. A rejected upload leaves the
/// document as it was.
pub fn replace_image(
    store: &EventStore,
    ctx: &RequestContext,
    id: &EventId,
    field: ImageField,
    upload: &UploadedFile,
) -> StoreResult<ConfigurationDocument> {
    let _span = info_span!("replace_image", user = %ctx.user, event = %id, field = field.key()).entered();
    let _guard = store.lock_event(id)?;

    let mut doc = documents::load(store, id)?;
    let previous = doc.image(field).to_string();

    let outcome = store_locked(store, id, field, Some(upload), &previous);
    if let Some(e) = outcome.error {
        return Err(e);
    }

    *doc.image_mut(field) = outcome.path.clone();
    match documents::save_locked(store, id, doc) {
        Ok(saved) => Ok(saved),
        Err(e) => {
            supersede(store, id, &outcome.path, &previous);
            Err(e)
        }
    }
}

/// Delete files in the event's asset directory that no field references
pub fn prune_orphans(store: &EventStore, ctx: &RequestContext, id: &EventId) -> StoreResult<Vec<String>> {
    let _span = info_span!("prune_assets", user = %ctx.user, event = %id).entered();
    let _guard = store.lock_event(id)?;

    let referenced = documents::load(store, id)?.referenced_files(id);
    let dir = store.config.asset_dir(id);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || referenced.contains(&name) {
            continue;
        }
        fs::remove_file(entry.path())?;
        removed.push(name);
    }

    removed.sort();
    info!(count = removed.len(), "orphaned assets pruned");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn staged(dir: &TempDir, name: &str, mime: &str) -> UploadedFile {
        let temp_path = dir.path().join(format!("upload-{}", name));
        fs::write(&temp_path, b"\x89PNG fake image bytes").unwrap();
        UploadedFile {
            temp_path,
            original_name: name.to_string(),
            mime_type: mime.to_string(),
            size: 21,
        }
    }

    fn resolve(store: &EventStore, path: &str) -> PathBuf {
        store.config().resolve_asset(&AssetRef::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn test_no_upload_is_a_noop() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();

        let outcome = store
            .store_asset(&ctx(), &event.id, ImageField::Logo, None, "https://cdn.test/a.png")
            .unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.path, "https://cdn.test/a.png");
    }

    #[test]
    fn test_store_generates_name_and_moves_upload() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();
        let upload = staged(&uploads, "My Logo.PNG", "image/png");

        let outcome = store
            .store_asset(&ctx(), &event.id, ImageField::Logo, Some(&upload), "")
            .unwrap();

        assert!(outcome.is_ok());
        let prefix = format!("assets/{}/logo_", event.id);
        assert!(outcome.path.starts_with(&prefix), "{}", outcome.path);
        assert!(outcome.path.ends_with(".png"));
        assert!(resolve(&store, &outcome.path).is_file());
        assert!(!upload.temp_path.exists());
    }

    #[test]
    fn test_rejected_type_returns_previous_path() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();
        let upload = staged(&uploads, "script.php", "application/x-php");

        let outcome = store
            .store_asset(&ctx(), &event.id, ImageField::Banner, Some(&upload), "https://cdn.test/b.png")
            .unwrap();

        assert_eq!(outcome.path, "https://cdn.test/b.png");
        assert!(matches!(outcome.error, Some(StoreError::Validation(_))));
        assert!(upload.temp_path.exists());
    }

    #[test]
    fn test_supersede_deletes_previous_after_store() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();

        let first = store
            .store_asset(&ctx(), &event.id, ImageField::Logo, Some(&staged(&uploads, "a.png", "image/png")), "")
            .unwrap();
        let second = store
            .store_asset(
                &ctx(),
                &event.id,
                ImageField::Logo,
                Some(&staged(&uploads, "b.png", "image/png")),
                &first.path,
            )
            .unwrap();

        assert_ne!(first.path, second.path);
        assert!(!resolve(&store, &first.path).exists());
        assert!(resolve(&store, &second.path).is_file());
    }

    #[test]
    fn test_supersede_never_touches_other_events() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let a = store.create(&ctx(), "A").unwrap();
        let b = store.create(&ctx(), "B").unwrap();
        fs::create_dir_all(store.config().asset_dir(&b.id)).unwrap();
        let foreign = store.config().asset_dir(&b.id).join("logo.png");
        fs::write(&foreign, b"png").unwrap();

        let outcome = store
            .store_asset(
                &ctx(),
                &a.id,
                ImageField::Logo,
                Some(&staged(&uploads, "a.png", "image/png")),
                &format!("assets/{}/logo.png", b.id),
            )
            .unwrap();

        assert!(outcome.is_ok());
        assert!(foreign.exists());
    }

    #[test]
    fn test_replace_image_updates_field_and_removes_old_file() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();
        let field = ImageField::SocialIcon(crate::types::SocialSlot::Social2);

        let first = store
            .replace_image(&ctx(), &event.id, field, &staged(&uploads, "x.svg", "image/svg+xml"))
            .unwrap();
        let old_path = first.image(field).to_string();
        assert!(old_path.contains("/social2_icon_"));

        let second = store
            .replace_image(&ctx(), &event.id, field, &staged(&uploads, "y.svg", "image/svg+xml"))
            .unwrap();
        assert_ne!(second.image(field), old_path);
        assert!(!resolve(&store, &old_path).exists());
        assert_eq!(store.load_document(&event.id).unwrap(), second);
    }

    #[test]
    fn test_replace_image_keeps_old_file_when_move_fails() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();

        let before = store
            .replace_image(&ctx(), &event.id, ImageField::Logo, &staged(&uploads, "a.png", "image/png"))
            .unwrap();

        let mut missing = staged(&uploads, "b.png", "image/png");
        fs::remove_file(&missing.temp_path).unwrap();
        missing.temp_path = uploads.path().join("vanished.png");

        let err = store
            .replace_image(&ctx(), &event.id, ImageField::Logo, &missing)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        let after = store.load_document(&event.id).unwrap();
        assert_eq!(after.logo, before.logo);
        assert!(resolve(&store, &before.logo).is_file());
    }

    #[test]
    fn test_prune_removes_only_unreferenced_files() {
        let (store, _dir) = create_test_store();
        let uploads = TempDir::new().unwrap();
        let event = store.create(&ctx(), "Demo").unwrap();

        let doc = store
            .replace_image(&ctx(), &event.id, ImageField::Logo, &staged(&uploads, "a.png", "image/png"))
            .unwrap();
        let asset_dir = store.config().asset_dir(&event.id);
        fs::write(asset_dir.join("leaked.png"), b"png").unwrap();

        let removed = store.prune_orphans(&ctx(), &event.id).unwrap();

        assert_eq!(removed, vec!["leaked.png".to_string()]);
        assert!(resolve(&store, &doc.logo).is_file());
    }
}
