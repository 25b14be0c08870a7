//! Get subtitles command

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

pub struct GetSubtitlesCommand {
    store: Arc<EventStore>,
}

impl GetSubtitlesCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for GetSubtitlesCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "get_subtitles",
            "Read an event's subtitle list in display order",
            json!({
                "type": "object",
                "properties": { "eventId": event_id_schema() }
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        CommandOutcome::new(&self.store.load_subtitles(&id)?)
    }
}
