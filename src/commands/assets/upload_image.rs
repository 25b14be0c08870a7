//! Upload image command

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::commands::{event_id_schema, target_event};
use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{parse_params, Command, CommandOutcome, CommandSpec};
use crate::store::EventStore;
use crate::types::{ImageField, UploadedFile};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    event_id: Option<String>,
    field: String,
    file: UploadedFile,
}

/// Stores an uploaded image and points a document field at it
///
/// The previously referenced file is deleted once the document is saved.
pub struct UploadImageCommand {
    store: Arc<EventStore>,
}

impl UploadImageCommand {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

impl Command for UploadImageCommand {
    fn definition(&self) -> CommandSpec {
        let fields: Vec<&str> = ImageField::all().map(|f| f.key()).collect();
        CommandSpec::new(
            "upload_image",
            "Store an uploaded image (JPEG, PNG, GIF, WebP or SVG, at most 5 MiB) in an image field",
            json!({
                "type": "object",
                "properties": {
                    "eventId": event_id_schema(),
                    "field": { "type": "string", "enum": fields },
                    "file": {
                        "type": "object",
                        "properties": {
                            "tempPath": { "type": "string", "description": "Where the upload was staged" },
                            "originalName": { "type": "string" },
                            "mimeType": { "type": "string" },
                            "size": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["tempPath", "originalName", "mimeType", "size"]
                    }
                },
                "required": ["field", "file"]
            }),
        )
    }

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome> {
        let params: Params = parse_params(params)?;
        let id = target_event(ctx, params.event_id.as_deref())?;
        let field = ImageField::parse(&params.field)?;

        let doc = self.store.replace_image(ctx, &id, field, &params.file)?;
        CommandOutcome::new(&json!({
            "field": field.key(),
            "path": doc.image(field),
            "configuration": doc,
        }))
    }
}
