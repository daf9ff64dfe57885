//! `intercore rpc`: one JSON-RPC call against a fresh in-process topology.

use intercore_server::rpc::RpcRouter;
use intercore_server::AppState;
use serde_json::{json, Value};

use super::print_json;

/// Dispatch `method` with `params_str` and return the raw response.
pub async fn call(state: &AppState, method: &str, params_str: &str) -> Result<Value, String> {
    let params: Value = serde_json::from_str(params_str).map_err(|e| format!("Invalid JSON params: {}", e))?;

    let router = RpcRouter::new(state.clone());
    Ok(router
        .handle_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        }))
        .await)
}

pub async fn run(state: &AppState, method: &str, params_str: &str) -> Result<(), String> {
    let response = call(state, method, params_str).await?;
    print_json(&response);
    if response.get("error").is_some() {
        return Err(format!("{} failed", method));
    }
    Ok(())
}
