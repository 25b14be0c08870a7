//! Get configuration command

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
}

/// Returns the configuration document with defaults merged in
pub struct GetConfigurationCommand {
    store: Arc<EventStore>,
}

impl GetConfigurationCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for GetConfigurationCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "get_configuration",
            "Read an event's configuration document",
            json!({
                "type": "object",
                "properties": { "eventId": event_id_schema() }
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        CommandOutcome::new(&self.store.load_document(&id)?)
    }
}
