//! Command table
//!
//! One typed handler per action identifier, grouped by area:
//! - Event commands (6): registry and identifier changes
//! - Document commands (4): configuration and subtitles
//! - Asset commands (2): image upload and orphan pruning
//! - Backup commands (2): export and restore

pub mod assets;
pub mod backup;
pub mod documents;
pub mod events;

use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::server::CommandServer;
use crate::store::EventStore;
use crate::types::EventId;

pub use assets::{PruneAssetsCommand, UploadImageCommand};
pub use backup::{ExportBackupCommand, RestoreBackupCommand};
pub use documents::{
    GetConfigurationCommand, GetSubtitlesCommand, SaveConfigurationCommand, SaveSubtitlesCommand,
};
pub use events::{
    ChangeEventIdCommand, CreateEventCommand, DeleteEventCommand, ListEventsCommand,
    RenameEventCommand, SelectEventCommand,
};

/// Register all commands with the server
pub fn register_all_commands(server: &mut CommandServer, store: Arc<EventStore>) {
    // Event commands (6)
    server.register_command(Box::new(ListEventsCommand::new(store.clone())));
    server.register_command(Box::new(SelectEventCommand::new(store.clone())));
    server.register_command(Box::new(CreateEventCommand::new(store.clone())));
    server.register_command(Box::new(RenameEventCommand::new(store.clone())));
    server.register_command(Box::new(DeleteEventCommand::new(store.clone())));
    server.register_command(Box::new(ChangeEventIdCommand::new(store.clone())));

    // Document commands (4)
    server.register_command(Box::new(GetConfigurationCommand::new(store.clone())));
    server.register_command(Box::new(SaveConfigurationCommand::new(store.clone())));
    server.register_command(Box::new(GetSubtitlesCommand::new(store.clone())));
    server.register_command(Box::new(SaveSubtitlesCommand::new(store.clone())));

    // Asset commands (2)
    server.register_command(Box::new(UploadImageCommand::new(store.clone())));
    server.register_command(Box::new(PruneAssetsCommand::new(store.clone())));

    // Backup commands (2)
    server.register_command(Box::new(ExportBackupCommand::new(store.clone())));
    server.register_command(Box::new(RestoreBackupCommand::new(store)));
}

/// Target event: the explicit `eventId` argument, else the session's active event
pub(crate) fn target_event(ctx: &RequestContext, explicit: Option<&str>) -> StoreResult<EventId> {
    ctx.resolve_event(explicit)
}

/// Schema fragment shared by commands taking an optional event id
pub(crate) fn event_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Event id; defaults to the active event"
    })
}
