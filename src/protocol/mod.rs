//! Protocol types for the JSON-RPC command server

mod command;
mod jsonrpc;

pub use command::{parse_params, Command, CommandOutcome, CommandSpec, ServerInfo};
pub use jsonrpc::{
    error_code, ErrorObject, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
