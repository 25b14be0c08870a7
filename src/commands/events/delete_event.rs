//! Delete event command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::EventId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: String,
}

/// Deletes an event with its documents and assets
///
/// Deleting the active event moves the session to the first remaining one.
pub struct DeleteEventCommand {
    store: Arc<EventStore>,
}

impl DeleteEventCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for DeleteEventCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "delete_event",
            "Delete an event, its documents and its assets. The last event cannot be deleted",
            json!({
                "type": "object",
                "properties": {
                    "eventId": { "type": "string", "description": "Id of the event to delete" }
                },
                "required": ["eventId"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = EventId::parse(&params.event_id)?;
        self.store.delete(ctx, &id)?;

        let fallback = match &ctx.active_event {
            Some(active) if active == &id => self.store.list().into_iter().next().map(|e| e.id),
            _ => None,
        };
        let active = fallback.clone().or_else(|| ctx.active_event.clone());

        let outcome = CommandOutcome::new(&json!({
            "deleted": id,
            "activeEvent": active,
        }))?;
        Ok(match fallback {
            Some(next) => outcome.selecting(next),
            None => outcome,
        })
    }
}
