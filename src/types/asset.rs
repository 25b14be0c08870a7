//! Asset references, image fields and uploads
//!
//! `AssetRef` is the single place where a path-valued document field is
//! interpreted. A stored reference always has the shape
//! `assets/<event_id>/<file>` with `file` a single safe path segment.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::EventId;
use crate::error::{StoreError, StoreResult};

/// Prefix of every store-relative asset path
pub const ASSETS_PREFIX: &str = "assets";

/// Interpreted value of a path-valued field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Empty,
    External(String),
    Stored { event: EventId, file: String },
}

impl AssetRef {
    /// Interpret `raw` without tying it to an owning event
    ///
    /// Stored references must still name a well-formed event id and a safe
    /// file segment.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(AssetRef::Empty);
        }
        if is_external_url(raw) {
            return Ok(AssetRef::External(raw.to_string()));
        }

        let mut parts = raw.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(ASSETS_PREFIX), Some(event), Some(file), None) => {
                let event = EventId::parse(event).map_err(|_| bad_path(raw))?;
                if !is_safe_file_name(file) {
                    return Err(bad_path(raw));
                }
                Ok(AssetRef::Stored {
                    event,
                    file: file.to_string(),
                })
            }
            _ => Err(bad_path(raw)),
        }
    }

    /// Interpret `raw` as a field of `owner`'s document
    ///
    /// Rejects stored references into another event's directory.
    pub fn parse_owned(raw: &str, owner: &EventId) -> StoreResult<Self> {
        let parsed = Self::parse(raw)?;
        if let AssetRef::Stored { event, .. } = &parsed {
            if event != owner {
                return Err(StoreError::validation(format!(
                    "path '{}' points into the assets of event '{}', not '{}'",
                    raw.trim(),
                    event,
                    owner
                )));
            }
        }
        Ok(parsed)
    }

    pub fn stored(event: &EventId, file: impl Into<String>) -> StoreResult<Self> {
        let file = file.into();
        if !is_safe_file_name(&file) {
            return Err(StoreError::validation(format!("unsafe asset file name '{}'", file)));
        }
        Ok(AssetRef::Stored {
            event: event.clone(),
            file,
        })
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, AssetRef::Stored { .. })
    }

    /// Path below the data root, e.g. `assets/demo/logo.png`
    pub fn relative_path(&self) -> Option<PathBuf> {
        match self {
            AssetRef::Stored { event, file } => {
                Some(PathBuf::from(ASSETS_PREFIX).join(event.as_str()).join(file))
            }
            _ => None,
        }
    }

}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Empty => Ok(()),
            AssetRef::External(url) => f.write_str(url),
            AssetRef::Stored { event, file } => write!(f, "{}/{}/{}", ASSETS_PREFIX, event, file),
        }
    }
}

fn bad_path(raw: &str) -> StoreError {
    StoreError::validation(format!(
        "'{}' is not an allowed path: use an http(s) URL or {}/<event_id>/<file>",
        raw, ASSETS_PREFIX
    ))
}

pub fn is_external_url(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// Single path segment made of `[A-Za-z0-9._-]`, not hidden, not `..`
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Social slot of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialSlot {
    Social1,
    Social2,
    Social3,
    Social4,
}

impl SocialSlot {
    pub const ALL: [SocialSlot; 4] = [
        SocialSlot::Social1,
        SocialSlot::Social2,
        SocialSlot::Social3,
        SocialSlot::Social4,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SocialSlot::Social1 => "social1",
            SocialSlot::Social2 => "social2",
            SocialSlot::Social3 => "social3",
            SocialSlot::Social4 => "social4",
        }
    }
}

/// Image-valued field of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageField {
    Logo,
    PreBanner,
    EndBanner,
    Banner,
    SocialIcon(SocialSlot),
}

impl ImageField {
    pub const TOP_LEVEL: [ImageField; 4] = [
        ImageField::Logo,
        ImageField::PreBanner,
        ImageField::EndBanner,
        ImageField::Banner,
    ];

    /// Field name as it appears in commands and in generated file names
    pub fn key(self) -> &'static str {
        match self {
            ImageField::Logo => "logo",
            ImageField::PreBanner => "preBanner",
            ImageField::EndBanner => "endBanner",
            ImageField::Banner => "banner",
            ImageField::SocialIcon(SocialSlot::Social1) => "social1.icon",
            ImageField::SocialIcon(SocialSlot::Social2) => "social2.icon",
            ImageField::SocialIcon(SocialSlot::Social3) => "social3.icon",
            ImageField::SocialIcon(SocialSlot::Social4) => "social4.icon",
        }
    }

    pub fn parse(raw: &str) -> StoreResult<Self> {
        Self::all()
            .find(|f| f.key() == raw)
            .ok_or_else(|| StoreError::validation(format!("unknown image field '{}'", raw)))
    }

    pub fn all() -> impl Iterator<Item = ImageField> {
        Self::TOP_LEVEL
            .into_iter()
            .chain(SocialSlot::ALL.into_iter().map(ImageField::SocialIcon))
    }

    /// Stem used when generating a file name for this field
    pub fn file_stem(self) -> String {
        self.key().replace('.', "_")
    }
}

/// Uploaded file as handed over by the request layer
///
/// `temp_path` is where the upload currently lives; the store moves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub temp_path: PathBuf,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Which per-event document a backup or restore targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Configuration,
    Subtitles,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Configuration => "configuration",
            DocumentKind::Subtitles => "subtitles",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Configuration => "configuration.json",
            DocumentKind::Subtitles => "subtitles.json",
        }
    }

    pub fn parse(raw: &str) -> StoreResult<Self> {
        match raw {
            "configuration" => Ok(DocumentKind::Configuration),
            "subtitles" => Ok(DocumentKind::Subtitles),
            other => Err(StoreError::validation(format!(
                "unknown document kind '{}': expected configuration or subtitles",
                other
            ))),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
