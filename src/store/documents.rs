//! Per-event configuration and subtitle documents

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::types::{ConfigurationDocument, DocumentKind, EventId, Subtitle};
use crate::utils::atomic_write;
use crate::validation::validate_document;

use super::{assets, EventStore};

/// Raw bytes of a document, `None` if the file does not exist
pub(crate) fn read_raw(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(store: &EventStore, path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_vec_pretty(value)?;
    atomic_write(&store.locks, path, &content)?;
    Ok(())
}

/// Load the configuration document, falling back to the template
///
/// A missing file yields the template; a malformed one yields the template
/// and a warning, and is left on disk untouched.
pub fn load(store: &EventStore, id: &EventId) -> StoreResult<ConfigurationDocument> {
    let path = store.config.document_path(id, DocumentKind::Configuration);
    let Some(bytes) = read_raw(&path)? else {
        return Ok(ConfigurationDocument::default());
    };

    match ConfigurationDocument::from_slice(&bytes) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            warn!(event = %id, error = %e, "configuration is malformed, using defaults");
            Ok(ConfigurationDocument::default())
        }
    }
}

/// Validate and persist a configuration document
pub fn save(
    store: &EventStore,
    ctx: &RequestContext,
    id: &EventId,
    doc: ConfigurationDocument,
) -> StoreResult<ConfigurationDocument> {
    let _span = info_span!("save_configuration", user = %ctx.user, event = %id).entered();
    let _guard = store.lock_event(id)?;
    save_locked(store, id, doc)
}

/// Save while the caller already holds the event lock
///
/// Stored files whose field now holds a different value are deleted once
/// the new document is on disk.
pub(crate) fn save_locked(
    store: &EventStore,
    id: &EventId,
    mut doc: ConfigurationDocument,
) -> StoreResult<ConfigurationDocument> {
    doc.merge_defaults();
    validate_document(&doc, id, &store.config.asset_dir(id))?;

    let previous = load(store, id)?;
    write_json(store, &store.config.document_path(id, DocumentKind::Configuration), &doc)?;
    info!("configuration saved");

    assets::release_replaced(store, id, &previous, &doc);
    Ok(doc)
}

/// Load the subtitle list; missing or malformed files read as empty
pub fn load_subtitles(store: &EventStore, id: &EventId) -> StoreResult<Vec<Subtitle>> {
    let path = store.config.document_path(id, DocumentKind::Subtitles);
    let Some(bytes) = read_raw(&path)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_slice(&bytes) {
        Ok(subtitles) => Ok(subtitles),
        Err(e) => {
            warn!(event = %id, error = %e, "subtitles are malformed, using an empty list");
            Ok(Vec::new())
        }
    }
}

/// Persist the subtitle list in the given order, dropping blank entries
pub fn save_subtitles(
    store: &EventStore,
    ctx: &RequestContext,
    id: &EventId,
    subtitles: Vec<Subtitle>,
) -> StoreResult<Vec<Subtitle>> {
    let _span = info_span!("save_subtitles", user = %ctx.user, event = %id).entered();
    let _guard = store.lock_event(id)?;

    let subtitles: Vec<Subtitle> = subtitles.into_iter().filter(|s| !s.is_blank()).collect();
    write_json(store, &store.config.document_path(id, DocumentKind::Subtitles), &subtitles)?;

    info!(count = subtitles.len(), "subtitles saved");
    Ok(subtitles)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_missing_document_loads_template() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        fs::remove_file(store.config().document_path(&event.id, DocumentKind::Configuration)).unwrap();

        let doc = store.load_document(&event.id).unwrap();
        assert_eq!(doc, ConfigurationDocument::default());
    }

    #[test]
    fn test_malformed_document_loads_template_without_rewriting() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let path = store.config().document_path(&event.id, DocumentKind::Configuration);
        fs::write(&path, "{{{").unwrap();

        assert_eq!(store.load_document(&event.id).unwrap(), ConfigurationDocument::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{{");
    }

    #[test]
    fn test_save_then_load() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();

        let mut doc = store.load_document(&event.id).unwrap();
        doc.title = "Keynote".to_string();
        doc.buttons.btn1.title = "Tickets".to_string();
        doc.buttons.btn1.link = "https://tickets.test".to_string();
        doc.start_time = "2026-09-01T18:00".to_string();
        store.save_document(&ctx(), &event.id, doc.clone()).unwrap();

        assert_eq!(store.load_document(&event.id).unwrap(), doc);
    }

    #[test]
    fn test_save_rejects_cross_event_reference_and_keeps_file() {
        let (store, _dir) = create_test_store();
        let a = store.create(&ctx(), "A").unwrap();
        let b = store.create(&ctx(), "B").unwrap();
        fs::create_dir_all(store.config().asset_dir(&b.id)).unwrap();
        fs::write(store.config().asset_dir(&b.id).join("logo.png"), b"png").unwrap();

        let path = store.config().document_path(&a.id, DocumentKind::Configuration);
        let before = fs::read(&path).unwrap();

        let mut doc = store.load_document(&a.id).unwrap();
        doc.logo = format!("assets/{}/logo.png", b.id);
        let err = store.save_document(&ctx(), &a.id, doc).unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    fn stored_asset(store: &EventStore, id: &EventId, file: &str) -> (String, std::path::PathBuf) {
        let dir = store.config().asset_dir(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), b"png").unwrap();
        (format!("assets/{}/{}", id, file), dir.join(file))
    }

    #[test]
    fn test_overwritten_image_field_deletes_old_file() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let (logo, logo_file) = stored_asset(&store, &event.id, "logo_1.png");
        let (icon, icon_file) = stored_asset(&store, &event.id, "social1_icon_1.svg");
        let (next_icon, next_icon_file) = stored_asset(&store, &event.id, "social1_icon_2.svg");

        let mut doc = store.load_document(&event.id).unwrap();
        doc.logo = logo;
        doc.socials.social1.icon = icon;
        store.save_document(&ctx(), &event.id, doc.clone()).unwrap();
        assert!(logo_file.is_file() && icon_file.is_file());

        doc.logo = "https://cdn.test/x.png".to_string();
        doc.socials.social1.icon = next_icon;
        store.save_document(&ctx(), &event.id, doc).unwrap();

        assert!(!logo_file.exists());
        assert!(!icon_file.exists());
        assert!(next_icon_file.is_file());
    }

    #[test]
    fn test_cleared_field_keeps_file_still_used_elsewhere() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let (shared, shared_file) = stored_asset(&store, &event.id, "banner_1.png");

        let mut doc = store.load_document(&event.id).unwrap();
        doc.banner = shared.clone();
        doc.pre_banner = shared;
        store.save_document(&ctx(), &event.id, doc.clone()).unwrap();

        doc.banner = String::new();
        store.save_document(&ctx(), &event.id, doc.clone()).unwrap();
        assert!(shared_file.is_file());

        doc.pre_banner = String::new();
        store.save_document(&ctx(), &event.id, doc).unwrap();
        assert!(!shared_file.exists());
    }

    #[test]
    fn test_rejected_save_deletes_nothing() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let (logo, logo_file) = stored_asset(&store, &event.id, "logo_1.png");

        let mut doc = store.load_document(&event.id).unwrap();
        doc.logo = logo;
        store.save_document(&ctx(), &event.id, doc.clone()).unwrap();

        doc.logo = "../../etc/passwd".to_string();
        assert!(store.save_document(&ctx(), &event.id, doc).is_err());
        assert!(logo_file.is_file());
    }

    #[test]
    fn test_save_subtitles_drops_blank_entries_and_keeps_order() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();

        let saved = store
            .save_subtitles(
                &ctx(),
                &event.id,
                vec![
                    Subtitle::new("Second act", ""),
                    Subtitle::new("", "https://ignored.test"),
                    Subtitle::new("   ", ""),
                    Subtitle::new("Opening", "https://open.test"),
                ],
            )
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(store.load_subtitles(&event.id).unwrap(), saved);
        assert_eq!(saved[0].text, "Second act");
        assert_eq!(saved[1].link, "https://open.test");
    }

    #[test]
    fn test_entry_without_text_does_not_hide_the_list() {
        let (store, _dir) = create_test_store();
        let event = store.create(&ctx(), "Demo").unwrap();
        let raw = br#"[{"text":"Opening"},{"link":"https://x.test"},{"text":"Close","link":""}]"#;
        store
            .restore(&ctx(), &event.id, DocumentKind::Subtitles, raw)
            .unwrap();

        let loaded = store.load_subtitles(&event.id).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].text, "Opening");
        assert_eq!(loaded[1], Subtitle::new("", "https://x.test"));
        assert_eq!(loaded[2].text, "Close");
    }

    #[test]
    fn test_save_for_unknown_event_is_not_found() {
        let (store, _dir) = create_test_store();
        let ghost = EventId::parse("ghost").unwrap();
        let err = store
            .save_subtitles(&ctx(), &ghost, vec![Subtitle::new("x", "")])
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!store.config().event_dir(&ghost).exists());
    }
}
