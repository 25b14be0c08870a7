//! Save configuration command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::ConfigurationDocument;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    configuration: ConfigurationDocument,
}

/// Validates and persists a configuration document
///
/// Missing fields take their default values; unknown keys are dropped.
pub struct SaveConfigurationCommand {
    store: Arc<EventStore>,
}

impl SaveConfigurationCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for SaveConfigurationCommand {
    fn definition(&self) -> CommandSpec {
        CommandSpec::new(
            "save_configuration",
            "Validate and save an event's configuration document",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "configuration": {
                        "type": "object",
                        "description": "Document fields: title, homeUrl, embedCode, startTime, endTime, pollInterval, subtitleInterval, logo, preBanner, endBanner, banner, colors, buttons (btn1..btn4), socials (social1..social4)"
                    }
                },
                "required": ["configuration"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        CommandOutcome::new(&self.store.save_document(ctx, &id, params.configuration)?)
    }
}
