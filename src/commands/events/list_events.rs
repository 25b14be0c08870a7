//! List events command

use std::sync::Arc;

use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;

/// Lists the registry together with the session's active event
pub struct ListEventsCommand {
    store: Arc<EventStore>,
}

impl ListEventsCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for ListEventsCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "list_events",
            "List all events in registry order",
            json!({ "type": "object", "properties": {} }),
        )
    }

    fn execute(&self, ctx: &RequestContext, _params: Value) -> StoreResult<CommandOutcome> {
        CommandOutcome::new(&json!({
            "events": self.store.list(),
            "activeEvent": ctx.active_event,
        }))
    }
}
