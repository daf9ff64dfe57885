pub mod rpc;

use axum::Router;

use crate::state::AppState;

/// Every built-in API route, before user services are layered on.
pub fn api_router() -> Router<AppState> {
    Router::new().nest("/api/rpc", rpc::router())
}
