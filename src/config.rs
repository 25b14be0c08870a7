//! Store and application configuration
//!
//! `StoreConfig` is also the path builder: every on-disk location is derived
//! here from a validated [`EventId`], so no caller assembles paths by hand.
//!
//! Environment:
//! - `EVENT_DESK_DATA_DIR`: data root (default `./data`)
//! - `EVENT_DESK_LOCK_TIMEOUT_MS`: bounded lock wait (default 5000)
//! - `EVENT_DESK_MAX_UPLOAD_BYTES`: upload ceiling (default 5 MiB)
//! - `EVENT_DESK_HTTP_ADDR`: enables the read-only HTTP API when set
//! - `EVENT_DESK_LOG_FORMAT`: `text` (default) or `json`
//! - `EVENT_DESK_USER`: actor name recorded for the stdio session

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{AssetRef, DocumentKind, EventId, ASSETS_PREFIX};
use crate::validation::MAX_UPLOAD_BYTES;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the EventStore
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory holding `events.json`, `events/` and `assets/`
    pub data_dir: PathBuf,
    /// How long a writer waits for a lock before failing
    pub lock_timeout: Duration,
    /// Upload size ceiling in bytes
    pub max_upload_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl StoreConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Load from `EVENT_DESK_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("EVENT_DESK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = env::var("EVENT_DESK_LOCK_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = env::var("EVENT_DESK_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.max_upload_bytes = bytes;
        }

        config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to events.json
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("events.json")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir.join("events")
    }

    /// Get path to an event's document directory
    pub fn event_dir(&self, id: &EventId) -> PathBuf {
        self.events_dir().join(id.as_str())
    }

    pub fn document_path(&self, id: &EventId, kind: DocumentKind) -> PathBuf {
        self.event_dir(id).join(kind.file_name())
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join(ASSETS_PREFIX)
    }

    /// Get path to an event's asset directory
    pub fn asset_dir(&self, id: &EventId) -> PathBuf {
        self.assets_dir().join(id.as_str())
    }

    /// Absolute location of a stored reference; `None` for empty or external
    pub fn resolve_asset(&self, asset: &AssetRef) -> Option<PathBuf> {
        asset.relative_path().map(|rel| self.data_dir.join(rel))
    }

    /// Lock key serializing every mutation of one event
    pub fn event_lock_key(&self, id: &EventId) -> PathBuf {
        self.data_dir.join(".locks").join(id.as_str())
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process-level settings for the server binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub http_addr: Option<SocketAddr>,
    pub log_format: LogFormat,
    pub user: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let http_addr = env::var("EVENT_DESK_HTTP_ADDR")
            .ok()
            .and_then(|v| v.parse::<SocketAddr>().ok());

        let log_format = match env::var("EVENT_DESK_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let user = env::var("EVENT_DESK_USER")
            .or_else(|_| env::var("USER"))
            .or_else(|_| env::var("USERNAME"))
            .unwrap_or_else(|_| "anonymous".to_string());

        Self {
            store: StoreConfig::from_env(),
            http_addr,
            log_format,
            user,
        }
    }
}
