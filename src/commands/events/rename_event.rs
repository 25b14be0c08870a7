//! Rename event command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    name: String,
}

/// Changes an event's display name; the id stays
pub struct RenameEventCommand {
    store: Arc<EventStore>,
}

impl RenameEventCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for RenameEventCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "rename_event",
            "Change the display name of an event",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "name": { "type": "string", "description": "New display name" }
                },
                "required": ["name"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        CommandOutcome::new(&self.store.rename(ctx, &id, &params.name)?)
    }
}
