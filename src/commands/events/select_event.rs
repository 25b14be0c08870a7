//! Select event command

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

/// Makes an existing event the session's active event
pub struct SelectEventCommand {
    store: Arc<EventStore>,
}

impl SelectEventCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for SelectEventCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "select_event",
            "Make an event the active event of this session",
            json!({
                "type": "object",
                "properties": {
                    "eventId": { "type": "string", "description": "Id of a registered event" }
                },
                "required": ["eventId"]
            }),
        )
    }

    fn execute(&self, _ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let event = self.store.get(&EventId::parse(&params.event_id)?)?;
        Ok(CommandOutcome::new(&event)?.selecting(event.id))
    }
}
