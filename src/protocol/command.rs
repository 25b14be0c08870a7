//! Command table types

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{StoreError, StoreResult};
use crate::types::EventId;

/// Command definition returned by `commands/list`
#[derive(Serialize, Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl CommandSpec {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// What a command hands back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub result: Value,
    /// New active event for the session, if the command changed it
    pub select: Option<EventId>,
}

impl CommandOutcome {
    pub fn new<T: Serialize>(result: &T) -> StoreResult<Self> {
        Ok(Self {
            result: serde_json::to_value(result)?,
            select: None,
        })
    }

    pub fn selecting(mut self, id: EventId) -> Self {
        self.select = Some(id);
        self
    }
}

/// Server information for the `initialize` handshake
#[derive(Clone, Debug)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: String, version: String) -> Self {
        Self { name, version }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One entry of the command table
///
/// Each command declares its input shape in `definition` and parses its
/// arguments into its own typed struct.
pub trait Command: Send + Sync {
    fn definition(&self) -> CommandSpec;

    fn execute(&self, ctx: &RequestContext, params: Value) -> StoreResult<CommandOutcome>;

    fn name(&self) -> String {
        self.definition().name
    }
}

/// Deserialize command arguments, reporting bad input as a validation error
pub fn parse_params<T: DeserializeOwned>(params: Value) -> StoreResult<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| StoreError::validation(format!("invalid arguments: {}", e)))
}
