//! Prune assets command

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

/// Deletes asset files no document field references
pub struct PruneAssetsCommand {
    store: Arc<EventStore>,
}

impl PruneAssetsCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for PruneAssetsCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "prune_assets",
            "Delete asset files of an event that no document field references",
            json!({
                "type": "object",
                "properties": { "eventId": event_id_schema() }
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        let removed = self.store.prune_orphans(ctx, &id)?;
        CommandOutcome::new(&json!({ "removed": removed }))
    }
}
