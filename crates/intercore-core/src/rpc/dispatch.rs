//! Name-keyed dispatch of inbound requests to typed capability handlers.
//!
//! A `CapabilityTable` is assembled once with a builder and is read-only
//! afterwards; clones share the same map. Each capability decodes its
//! arguments through a `FromArgs` impl before the handler runs, so a handler
//! only ever sees well-formed, typed parameters.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use super::envelope::{Any, Argument, ErrorCode, RequestEnvelope, ResponseEnvelope, TypedMessage};
use crate::error::HandlerError;

pub type HandlerResult = Result<Option<Any>, HandlerError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type Invoker = Arc<dyn Fn(&[Argument]) -> Result<HandlerFuture, HandlerError> + Send + Sync>;

/// Typed parameters of one capability, decoded from the request arguments.
pub trait FromArgs: Sized {
    /// Keys this capability requires, in wire order.
    const KEYS: &'static [&'static str];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError>;
}

/// Parameterless capabilities accept any argument list.
impl FromArgs for () {
    const KEYS: &'static [&'static str] = &[];

    fn from_args(_args: &[Argument]) -> Result<Self, HandlerError> {
        Ok(())
    }
}

/// Lookup helper used by `FromArgs` impls.
pub struct Args<'a> {
    args: &'a [Argument],
}

impl<'a> Args<'a> {
    pub fn new(args: &'a [Argument]) -> Self {
        Self { args }
    }

    pub fn expect_count(&self, expected: usize) -> Result<&Self, HandlerError> {
        if self.args.len() != expected {
            return Err(HandlerError::InvalidArgument(format!(
                "expected {} argument(s), got {}",
                expected,
                self.args.len()
            )));
        }
        Ok(self)
    }

    /// Decode the sole argument, whatever its key.
    pub fn only<T: TypedMessage>(&self) -> Result<T, HandlerError> {
        self.expect_count(1)?;
        let arg = &self.args[0];
        arg.value
            .unpack()
            .map_err(|e| HandlerError::InvalidArgument(format!("argument '{}': {}", arg.key, e)))
    }

    pub fn get<T: TypedMessage>(&self, key: &str) -> Result<T, HandlerError> {
        let arg = self
            .args
            .iter()
            .find(|a| a.key == key)
            .ok_or_else(|| HandlerError::InvalidArgument(format!("missing argument '{}'", key)))?;
        arg.value
            .unpack()
            .map_err(|e| HandlerError::InvalidArgument(format!("argument '{}': {}", key, e)))
    }
}

#[derive(Clone)]
struct Capability {
    keys: &'static [&'static str],
    stub: bool,
    invoker: Invoker,
}

/// Immutable `rpc name → handler` map.
#[derive(Clone, Default)]
pub struct CapabilityTable {
    capabilities: Arc<HashMap<String, Capability>>,
}

impl CapabilityTable {
    pub fn builder() -> CapabilityTableBuilder {
        CapabilityTableBuilder::default()
    }

    pub fn contains(&self, rpc: &str) -> bool {
        self.capabilities.contains_key(rpc)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_stub(&self, rpc: &str) -> bool {
        self.capabilities.get(rpc).map(|c| c.stub).unwrap_or(false)
    }

    pub fn required_keys(&self, rpc: &str) -> Option<&'static [&'static str]> {
        self.capabilities.get(rpc).map(|c| c.keys)
    }

    /// Run the capability named by `request` and build its single response.
    pub async fn dispatch(&self, request: &RequestEnvelope) -> ResponseEnvelope {
        let id = request.correlation_id.clone();

        let Some(capability) = self.capabilities.get(&request.rpc) else {
            warn!("[Dispatch] No capability registered for '{}'", request.rpc);
            return ResponseEnvelope::failure(
                id,
                ErrorCode::NotFound,
                format!("{} is not supported", request.rpc),
            );
        };

        let future = match (capability.invoker)(&request.args) {
            Ok(future) => future,
            Err(e) => {
                warn!(
                    rpc = %request.rpc,
                    keys = ?request.arg_keys(),
                    "[Dispatch] Rejected arguments: {}",
                    e
                );
                return ResponseEnvelope::failure(id, ErrorCode::InvalidArgument, e.reason());
            }
        };

        match future.await {
            Ok(result) => {
                debug!("[Dispatch] {} -> ok", request.rpc);
                ResponseEnvelope::success(id, result)
            }
            Err(e) => {
                debug!("[Dispatch] {} -> {}", request.rpc, e);
                ResponseEnvelope::failure(id, e.code(), e.reason())
            }
        }
    }
}

#[derive(Default)]
pub struct CapabilityTableBuilder {
    capabilities: HashMap<String, Capability>,
}

impl CapabilityTableBuilder {
    /// Register a typed handler under `name`.
    pub fn handle<P, F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        P: FromArgs + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let invoker: Invoker = Arc::new(move |args: &[Argument]| {
            let params = P::from_args(args)?;
            Ok(Box::pin(handler(params)) as HandlerFuture)
        });
        self.insert(
            name,
            Capability {
                keys: P::KEYS,
                stub: false,
                invoker,
            },
        );
        self
    }

    /// Register a capability that accepts anything and succeeds with an
    /// empty payload.
    pub fn stub(mut self, name: &str) -> Self {
        let invoker: Invoker = Arc::new(|_args: &[Argument]| {
            Ok(Box::pin(async { HandlerResult::Ok(None) }) as HandlerFuture)
        });
        self.insert(
            name,
            Capability {
                keys: &[],
                stub: true,
                invoker,
            },
        );
        self
    }

    pub fn build(self) -> CapabilityTable {
        CapabilityTable {
            capabilities: Arc::new(self.capabilities),
        }
    }

    fn insert(&mut self, name: &str, capability: Capability) {
        if self.capabilities.insert(name.to_string(), capability).is_some() {
            warn!("[Dispatch] Capability '{}' registered twice; keeping the last", name);
        }
    }
}
