//! Event Desk
//!
//! A file-backed, multi-tenant store of events. Each event owns a
//! configuration document, an ordered subtitle list and a directory of
//! image assets referenced from the document.
//!
//! # Features
//!
//! - **Atomic writes**: temp file + rename under a bounded-wait lock
//! - **Managed assets**: whitelisted uploads, generated names, delete-after-confirm
//! - **Identifier rename**: moves documents and assets and rewrites references,
//!   rolling back when the directory moves fail
//! - **Command table**: JSON-RPC over stdio, one typed handler per action
//! - **Viewer API**: read-only HTTP endpoints
//!
//! # Modules
//!
//! - `store`: the `EventStore` facade (registry, documents, assets, rename, backup)
//! - `types`: events, documents, asset references, uploads
//! - `validation`: upload and document rules
//! - `utils`: atomic writer, lock table, timestamps
//! - `commands` / `server` / `protocol`: the command host
//! - `api`: HTTP endpoints
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use event_desk::{CommandServer, EventStore, RequestContext, StoreConfig};
//! use event_desk::commands::register_all_commands;
//!
//! fn main() -> event_desk::StoreResult<()> {
//!     let store = Arc::new(EventStore::open(StoreConfig::new("data"))?);
//!     let mut server = CommandServer::new(RequestContext::new("admin"));
//!     register_all_commands(&mut server, store);
//!     server.run()
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod store;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used items at crate root
pub use config::{AppConfig, LogFormat, StoreConfig};
pub use context::RequestContext;
pub use error::{ErrorKind, ErrorReport, RenameStep, StoreError, StoreResult};
pub use protocol::{Command, CommandOutcome, CommandSpec, ServerInfo};
pub use server::CommandServer;
pub use store::{AssetOutcome, Backup, EventStore};
pub use types::{
    AssetRef, ConfigurationDocument, DocumentKind, Event, EventId, ImageField, Subtitle,
    UploadedFile,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
