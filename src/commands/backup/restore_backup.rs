//! Restore backup command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::kind_schema;
use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::DocumentKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    kind: String,
    content: String,
}

/// Replaces a document with uploaded content if it is valid JSON
pub struct RestoreBackupCommand {
    store: Arc<EventStore>,
}

impl RestoreBackupCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for RestoreBackupCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "restore_backup",
            "Replace an event's configuration or subtitles with a backup. Any valid JSON is written as-is",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "kind": kind_schema(),
                    "content": { "type": "string", "description": "Backup file content" }
                },
                "required": ["kind", "content"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        let kind = DocumentKind::parse(&params.kind)?;

        self.store.restore(ctx, &id, kind, params.content.as_bytes())?;
        CommandOutcome::new(&json!({ "restored": kind, "eventId": id }))
    }
}
