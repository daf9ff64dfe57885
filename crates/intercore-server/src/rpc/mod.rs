//! JSON-RPC 2.0 layer over the core's adapter proxy.
//!
//! Decoupled from axum so the same router serves the HTTP endpoint at
//! `/api/rpc` and the CLI's one-shot `rpc` command.
//!
//! ```ignore
//! let router = RpcRouter::new(app_state);
//! let response = router.handle_value(json!({
//!     "jsonrpc": "2.0",
//!     "id": 1,
//!     "method": "devices.adopt",
//!     "params": { "device": { "id": "...", "type": "simulated_olt" } }
//! })).await;
//! ```

pub mod error;
pub mod methods;
pub mod router;
pub mod types;

pub use error::RpcError;
pub use router::RpcRouter;
pub use types::{JsonRpcRequest, JsonRpcResponse};
