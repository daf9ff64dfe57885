//! Transport-agnostic JSON-RPC 2.0 dispatcher.
//!
//! `RpcRouter` is free of any HTTP dependency: the axum endpoint and the CLI
//! both feed it values directly.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

use super::error::RpcError;
use super::methods::devices::{self, Lifecycle};
use super::types::*;

const METHODS: &[&str] = &[
    "devices.adopt",
    "devices.disable",
    "devices.reenable",
    "devices.reboot",
    "devices.delete",
    "devices.ofpInfo",
    "devices.portInfo",
    "devices.updateFlowsBulk",
    "devices.updateFlowsIncremental",
    "devices.packetOut",
];

#[derive(Clone)]
pub struct RpcRouter {
    state: AppState,
}

impl RpcRouter {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Handle a raw JSON string and return the serialized response.
    pub async fn handle_request(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => encode(&JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e))),
        };
        response.to_string()
    }

    /// Handle a single request object or a batch array.
    pub async fn handle_value(&self, value: Value) -> Value {
        match value {
            Value::Array(batch) if batch.is_empty() => {
                encode(&JsonRpcResponse::error(None, INVALID_REQUEST, "Empty batch"))
            }
            Value::Array(batch) => {
                let mut responses = Vec::with_capacity(batch.len());
                for item in batch {
                    responses.push(self.handle_one(item).await);
                }
                encode(&responses)
            }
            other => encode(&self.handle_one(other).await),
        }
    }

    async fn handle_one(&self, value: Value) -> JsonRpcResponse {
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => JsonRpcResponse::error(None, INVALID_REQUEST, format!("Invalid request: {}", e)),
        }
    }

    pub async fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if req.jsonrpc != "2.0" {
            return JsonRpcResponse::error(req.id, INVALID_REQUEST, "Invalid JSON-RPC version, expected \"2.0\"");
        }

        let id = req.id.clone();
        let params = req.params.unwrap_or(Value::Object(Default::default()));

        match self.route(&req.method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                tracing::debug!("[RpcRouter] {} failed: {}", req.method, err);
                err.to_response(id)
            }
        }
    }

    async fn route(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let state = &self.state;
        match method {
            "devices.adopt" => to_result(devices::lifecycle(state, Lifecycle::Adopt, parse_params(params)?).await?),
            "devices.disable" => {
                to_result(devices::lifecycle(state, Lifecycle::Disable, parse_params(params)?).await?)
            }
            "devices.reenable" => {
                to_result(devices::lifecycle(state, Lifecycle::Reenable, parse_params(params)?).await?)
            }
            "devices.reboot" => to_result(devices::lifecycle(state, Lifecycle::Reboot, parse_params(params)?).await?),
            "devices.delete" => to_result(devices::lifecycle(state, Lifecycle::Delete, parse_params(params)?).await?),
            "devices.ofpInfo" => to_result(devices::ofp_info(state, parse_params(params)?).await?),
            "devices.portInfo" => to_result(devices::port_info(state, parse_params(params)?).await?),
            "devices.updateFlowsBulk" => to_result(devices::update_flows_bulk(state, parse_params(params)?).await?),
            "devices.updateFlowsIncremental" => {
                to_result(devices::update_flows_incremental(state, parse_params(params)?).await?)
            }
            "devices.packetOut" => to_result(devices::packet_out(state, parse_params(params)?).await?),
            _ => Err(RpcError::MethodNotFound(method.to_string())),
        }
    }

    /// Every method name this router answers, for discovery.
    pub fn method_list(&self) -> Vec<&'static str> {
        METHODS.to_vec()
    }
}

fn parse_params<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn to_result<T: Serialize>(result: T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| RpcError::Internal(format!("Failed to serialize result: {}", e)))
}

fn encode<T: Serialize>(response: &T) -> Value {
    serde_json::to_value(response).unwrap_or_else(|_| {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": INTERNAL_ERROR, "message": "Failed to serialize response" },
        })
    })
}
