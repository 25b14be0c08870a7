//! Save subtitles command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::Subtitle;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    subtitles: Vec<Subtitle>,
}

/// Replaces the subtitle list; entries with empty text are dropped
pub struct SaveSubtitlesCommand {
    store: Arc<EventStore>,
}

impl SaveSubtitlesCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for SaveSubtitlesCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "save_subtitles",
            "Replace an event's subtitle list, keeping the given order",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "subtitles": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "text": { "type": "string" },
                                "link": { "type": "string" }
                            },
                            "required": ["text"]
                        }
                    }
                },
                "required": ["subtitles"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        CommandOutcome::new(&self.store.save_subtitles(ctx, &id, params.subtitles)?)
    }
}
