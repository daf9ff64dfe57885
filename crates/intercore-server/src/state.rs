//! Shared state for the front-door handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use intercore_core::orchestrator::AdapterProxy;
use intercore_core::rpc::RpcEngine;

pub struct AppStateInner {
    /// The core-side engine the proxy invokes through.
    pub engine: RpcEngine,
    pub adapter_proxy: AdapterProxy,
    pub started_at: DateTime<Utc>,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(engine: RpcEngine) -> Self {
        Self {
            adapter_proxy: AdapterProxy::new(engine.clone()),
            engine,
            started_at: Utc::now(),
        }
    }
}
