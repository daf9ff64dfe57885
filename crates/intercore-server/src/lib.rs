//! Intercore Server: the HTTP/JSON-RPC front door of the core.
//!
//! Exposes the core's adapter proxy over axum, in plain HTTP or behind a
//! rustls acceptor. Embedders build an `AppState` around their core
//! `RpcEngine`, optionally register extra routes with
//! [`ApiServer::add_service`], and call [`ApiServer::start`].

pub mod api;
pub mod error;
pub mod rpc;
pub mod state;
pub mod tls;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ServerError;
pub use state::{AppState, AppStateInner};

pub const DEFAULT_PORT: u16 = 3220;

/// PEM files for the TLS front door.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve HTTPS when set.
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            tls: None,
        }
    }
}

/// A queued route registration, see [`ApiServer::add_service`].
pub type ServiceRegistration = Box<dyn FnOnce(Router<AppState>) -> Router<AppState> + Send>;

/// Install a `tracing` subscriber honouring `RUST_LOG`, falling back to
/// `default_filter`. A no-op when a subscriber is already installed.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.to_string().into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
    services: Vec<ServiceRegistration>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            services: Vec::new(),
            shutdown: CancellationToken::new(),
            task: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Queue a route registration. Registrations run in order when the
    /// server starts, after the built-in routes are in place.
    pub fn add_service<F>(&mut self, register: F) -> &mut Self
    where
        F: FnOnce(Router<AppState>) -> Router<AppState> + Send + 'static,
    {
        self.services.push(Box::new(register));
        self
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Bind and serve in the background. Returns the bound address, so a
    /// port of 0 picks a free one.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.task.is_some() {
            return Err(ServerError::AlreadyStarted);
        }
        if self.shutdown.is_cancelled() {
            return Err(ServerError::Stopped);
        }

        // TLS material is loaded before binding so bad files fail fast.
        let tls_config = self.config.tls.as_ref().map(tls::load_server_config).transpose()?;

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{}:{}: {}", self.config.host, self.config.port, e)))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

        let app = build_router(self.state.clone(), self.services.drain(..));
        let shutdown = self.shutdown.clone();

        let task = match tls_config {
            Some(config) => {
                tracing::info!("[ApiServer] listening on https://{}", local_addr);
                let acceptor = TlsAcceptor::from(Arc::new(config));
                tokio::spawn(tls::serve(listener, acceptor, app, shutdown))
            }
            None => {
                tracing::info!("[ApiServer] listening on http://{}", local_addr);
                tokio::spawn(async move {
                    let result = axum::serve(listener, app)
                        .with_graceful_shutdown(shutdown.cancelled_owned())
                        .await;
                    if let Err(e) = result {
                        tracing::error!("[ApiServer] server error: {}", e);
                    }
                })
            }
        };
        self.task = Some(task);
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight ones to drain.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("[ApiServer] server task ended abnormally: {}", e);
            }
        }
        tracing::info!("[ApiServer] stopped");
    }
}

/// The full router: built-in API routes, health, queued registrations,
/// CORS and HTTP tracing.
pub fn build_router<I>(state: AppState, services: I) -> Router
where
    I: IntoIterator<Item = ServiceRegistration>,
{
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let mut router = api::api_router().route("/api/health", get(health_check));
    for register in services {
        router = register(router);
    }
    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let engine = &state.engine;
    let status = if engine.is_shut_down() { "stopping" } else { "ok" };
    let subscribed = engine.subscribed_topics().await;
    Json(json!({
        "status": status,
        "server": "intercore-server",
        "version": env!("CARGO_PKG_VERSION"),
        "defaultTopic": engine.default_topic(),
        "subscribedTopics": subscribed,
        "pendingCalls": engine.pending_calls(),
        "startedAt": state.started_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use intercore_core::{MemoryBus, RpcEngine};
    use tower::ServiceExt;

    fn state() -> AppState {
        let engine = RpcEngine::new(Arc::new(MemoryBus::new()), Default::default());
        Arc::new(AppStateInner::new(engine))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_without_listener() {
        let app = build_router(state(), Vec::new());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["subscribedTopics"], json!([]));
    }

    #[tokio::test]
    async fn test_registrations_run_in_order() {
        let first: ServiceRegistration = Box::new(|r| r.route("/api/first", get(|| async { "first" })));
        let second: ServiceRegistration = Box::new(|r| r.route("/api/second", get(|| async { "second" })));
        let app = build_router(state(), vec![first, second]);

        let response = app
            .oneshot(Request::get("/api/second").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_default_config_is_plain_loopback() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.tls.is_none());
    }
}
