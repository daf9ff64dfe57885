//! `POST /api/rpc` for JSON-RPC calls and `GET /api/rpc/methods` for discovery.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::rpc::RpcRouter;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(rpc_handler))
        .route("/methods", get(list_methods))
}

async fn rpc_handler(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    Json(RpcRouter::new(state).handle_value(body).await)
}

async fn list_methods(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "methods": RpcRouter::new(state).method_list() }))
}
