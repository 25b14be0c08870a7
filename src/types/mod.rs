//! Data types for the event store
//!
//! This module contains the records persisted on disk and the value types
//! used to address them.

mod asset;
mod document;
mod event;

pub use asset::{
    is_external_url, is_safe_file_name, AssetRef, DocumentKind, ImageField, SocialSlot,
    UploadedFile, ASSETS_PREFIX,
};
pub use document::{
    rebase_asset_paths, Button, Buttons, ConfigurationDocument, Social, Socials, Subtitle,
    DEFAULT_COLORS, DEFAULT_POLL_INTERVAL, DEFAULT_SUBTITLE_INTERVAL,
};
pub use event::{Event, EventId, MAX_EVENT_ID_LEN};
