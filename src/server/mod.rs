//! Command server
//!
//! Line-delimited JSON-RPC over stdio. The server owns the session's
//! `RequestContext` and hands it to each command of the table.

mod handlers;

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::protocol::{
    Command, CommandSpec, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo,
};

pub use handlers::*;

/// Dispatches JSON-RPC requests to the command table
pub struct CommandServer {
    server_info: ServerInfo,
    commands: BTreeMap<String, Box<dyn Command>>,
    ctx: RequestContext,
}

impl CommandServer {
    pub fn new(ctx: RequestContext) -> Self {
        Self::with_info(ServerInfo::default(), ctx)
    }

    pub fn with_info(info: ServerInfo, ctx: RequestContext) -> Self {
        Self {
            server_info: info,
            commands: BTreeMap::new(),
            ctx,
        }
    }

    /// Register a command with the server
    pub fn register_command(&mut self, command: Box<dyn Command>) -> &mut Self {
        let name = command.name();
        self.commands.insert(name, command);
        self
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Serve stdin/stdout until stdin closes
    pub fn run(&mut self) -> StoreResult<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serve one request per line from `reader`, answering on `writer`
    pub fn serve<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> StoreResult<()> {
        info!(commands = self.commands.len(), "command server ready");
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if let Some(response) = self.handle_request(trimmed) {
                    writeln!(writer, "{}", response)?;
                    writer.flush()?;
                }
            }
            line.clear();
        }
        info!("input closed, command server stopping");
        Ok(())
    }

    /// Handle a single request line; `None` for notifications
    pub fn handle_request(&mut self, request_str: &str) -> Option<String> {
        let request: JsonRpcRequest = match serde_json::from_str(request_str) {
            Ok(req) => req,
            Err(e) => return encode(&JsonRpcError::parse_error(Value::Null, e.to_string())),
        };

        if !request.is_valid() {
            return encode(&JsonRpcError::invalid_request(
                request.id.unwrap_or(Value::Null),
                "jsonrpc must be '2.0'".to_string(),
            ));
        }
        if request.is_notification() {
            debug!(method = %request.method, "notification ignored");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => encode(&JsonRpcResponse::new(id, self.initialize_result())),
            "ping" => encode(&JsonRpcResponse::new(id, json!({}))),
            "commands/list" => {
                let commands: Vec<CommandSpec> = self.commands.values().map(|c| c.definition()).collect();
                encode(&JsonRpcResponse::new(id, json!({ "commands": commands })))
            }
            "commands/call" => self.handle_command_call(id, request.params),
            _ => encode(&JsonRpcError::method_not_found(id, request.method)),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "serverInfo": {
                "name": self.server_info.name,
                "version": self.server_info.version
            },
            "session": {
                "user": self.ctx.user,
                "activeEvent": self.ctx.active_event
            }
        })
    }

    fn handle_command_call(&mut self, id: Value, params: Option<Value>) -> Option<String> {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = extract_command_name(&params) else {
            return encode(&JsonRpcError::invalid_params(id, "missing command name".to_string()));
        };
        let Some(command) = self.commands.get(name) else {
            return encode(&JsonRpcError::new(
                id,
                crate::protocol::INVALID_PARAMS,
                "Unknown command".to_string(),
                Some(json!({ "command": name })),
            ));
        };

        match command.execute(&self.ctx, extract_arguments(&params)) {
            Ok(outcome) => {
                if let Some(selected) = outcome.select {
                    debug!(event = %selected, "active event changed");
                    self.ctx.active_event = Some(selected);
                }
                encode(&JsonRpcResponse::new(id, outcome.result))
            }
            Err(e) => {
                warn!(command = name, kind = %e.kind(), error = %e, "command failed");
                encode(&JsonRpcError::store_error(id, &e))
            }
        }
    }
}

fn encode<T: serde::Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "could not encode response");
            None
        }
    }
}
