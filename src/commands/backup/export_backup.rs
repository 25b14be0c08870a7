//! Export backup command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::kind_schema;
use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::DocumentKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    kind: String,
}

/// Returns a document's stored bytes with a download name
pub struct ExportBackupCommand {
    store: Arc<EventStore>,
}

impl ExportBackupCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for ExportBackupCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "export_backup",
            "Export the raw content of an event's configuration or subtitles",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "kind": kind_schema()
                },
                "required": ["kind"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        let backup = self.store.export(&id, DocumentKind::parse(&params.kind)?)?;

        // Content travels as a JSON string, so it must be the stored text unchanged
        let content = backup.as_text().ok_or_else(|| {
            StoreError::validation(format!(
                "{} is not UTF-8 text and cannot be exported as a string",
                backup.file_name
            ))
        })?;

        CommandOutcome::new(&json!({
            "fileName": backup.file_name,
            "contentType": backup.content_type,
            "content": content,
        }))
    }
}
