//! Create event command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;

#[derive(Debug, Deserialize)]
struct Params {
    name: String,
}

/// Creates an event with default documents and selects it
pub struct CreateEventCommand {
    store: Arc<EventStore>,
}

impl CreateEventCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for CreateEventCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "create_event",
            "Create a new event with a generated id and select it",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Display name of the event" }
                },
                "required": ["name"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let event = self.store.create(ctx, &params.name)?;
        Ok(CommandOutcome::new(&event)?.selecting(event.id))
    }
}
