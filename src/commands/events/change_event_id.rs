//! Change event id command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::EventId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    new_id: String,
}

/// Runs the identifier change transaction
///
/// The session follows the event when it was the active one.
pub struct ChangeEventIdCommand {
    store: Arc<EventStore>,
}

impl ChangeEventIdCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for ChangeEventIdCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "change_event_id",
            "Change an event's id, moving its documents and assets and rewriting asset paths",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "newId": {
                        "type": "string",
                        "description": "New id, letters, digits and underscores only"
                    }
                },
                "required": ["newId"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let current = target_event(ctx, params.event_id.as_deref())?;
        let new_id = EventId::parse(&params.new_id)?;

        let event = self.store.change_id(ctx, &current, &new_id)?;
        let outcome = CommandOutcome::new(&event)?;
        Ok(if ctx.active_event.as_ref() == Some(&current) {
            outcome.selecting(event.id)
        } else {
            outcome
        })
    }
}
