//! RPC engine: synchronous-looking calls over the message bus.
//!
//! Outbound, `invoke` publishes a request and parks on a per-call oneshot
//! keyed by correlation id until the matching response, the deadline, a
//! cancellation or engine shutdown resolves it. Inbound, every subscribed
//! topic runs one consumer task that resolves pending calls with responses
//! and hands requests to the bound `CapabilityTable`, one task per request.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::dispatch::CapabilityTable;
use super::envelope::{
    Any, Argument, BusMessage, CorrelationId, ErrorCode, ErrorDescriptor, MessageBody, RequestEnvelope,
    ResponseEnvelope, TypedMessage,
};
use crate::bus::{BusSubscription, MessageBus, SubscriptionId, Topic};
use crate::error::{BusError, RpcError};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Topic this engine consumes requests on and names as `from_topic`.
    pub default_topic: Topic,
    /// Deadline applied when the caller's context has none.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_topic: Topic::new("rwcore"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Per-call deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Abandon the call. Clones of this context share the token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Outcome of `RpcEngine::invoke`. On failure `payload` carries a packed
/// `ErrorDescriptor`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeResult {
    pub success: bool,
    pub payload: Option<Any>,
}

impl InvokeResult {
    pub fn ok(payload: Option<Any>) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    pub fn failed(code: ErrorCode, reason: impl Into<String>) -> Self {
        let descriptor = ErrorDescriptor {
            code,
            reason: reason.into(),
        };
        Self {
            success: false,
            payload: Any::pack(&descriptor).ok(),
        }
    }

    /// Classified error of a failed call.
    pub fn error(&self) -> Option<RpcError> {
        if self.success {
            return None;
        }
        let descriptor = self
            .payload
            .as_ref()
            .and_then(|p| p.unpack::<ErrorDescriptor>().ok());
        Some(match descriptor {
            Some(d) => d.into(),
            None => RpcError::Internal("failure response without error detail".to_string()),
        })
    }

    pub fn into_result(self) -> Result<Option<Any>, RpcError> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self.payload),
        }
    }

    /// Decode a successful, non-empty result.
    pub fn unpack<T: TypedMessage>(self) -> Result<T, RpcError> {
        let payload = self
            .into_result()?
            .ok_or_else(|| RpcError::Internal(format!("empty response, expected {}", T::TYPE_NAME)))?;
        Ok(payload.unpack()?)
    }
}

impl From<ResponseEnvelope> for InvokeResult {
    fn from(response: ResponseEnvelope) -> Self {
        Self {
            success: response.success,
            payload: response.result,
        }
    }
}

type Waiter = oneshot::Sender<ResponseEnvelope>;

/// State reachable from consumer tasks.
struct Shared {
    bus: Arc<dyn MessageBus>,
    default_topic: Topic,
    request_timeout: Duration,
    capabilities: OnceLock<CapabilityTable>,
    pending: Mutex<HashMap<CorrelationId, Waiter>>,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, HashMap<CorrelationId, Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, response: ResponseEnvelope) {
        let waiter = self.pending().remove(&response.correlation_id);
        match waiter {
            Some(waiter) => {
                let id = response.correlation_id.clone();
                if waiter.send(response).is_err() {
                    tracing::debug!("[RpcEngine] Caller of {} went away before the response", id);
                }
            }
            None => tracing::debug!(
                "[RpcEngine] Discarding response {} (no pending call)",
                response.correlation_id
            ),
        }
    }
}

/// Removes the pending entry however the waiting call ends.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: CorrelationId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.pending().remove(&self.id);
    }
}

struct SubscriptionEntry {
    id: SubscriptionId,
    cancel: CancellationToken,
}

/// Topics with a running consumer loop.
type Registry = tokio::sync::Mutex<HashMap<Topic, SubscriptionEntry>>;

struct EngineInner {
    shared: Arc<Shared>,
    subscriptions: Arc<Registry>,
    shutdown: CancellationToken,
}

/// Cheap to clone; clones share pending calls and subscriptions.
#[derive(Clone)]
pub struct RpcEngine {
    inner: Arc<EngineInner>,
}

/// Non-owning handle, for handlers that call back into their own engine.
#[derive(Clone)]
pub struct WeakRpcEngine {
    inner: Weak<EngineInner>,
}

impl WeakRpcEngine {
    pub fn upgrade(&self) -> Option<RpcEngine> {
        self.inner.upgrade().map(|inner| RpcEngine { inner })
    }
}

impl RpcEngine {
    pub fn new(bus: Arc<dyn MessageBus>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                shared: Arc::new(Shared {
                    bus,
                    default_topic: config.default_topic,
                    request_timeout: config.request_timeout,
                    capabilities: OnceLock::new(),
                    pending: Mutex::new(HashMap::new()),
                }),
                subscriptions: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Set the table inbound requests are dispatched to. Only the first
    /// binding takes effect.
    pub fn bind_capabilities(&self, table: CapabilityTable) -> Result<(), RpcError> {
        self.inner
            .shared
            .capabilities
            .set(table)
            .map_err(|_| RpcError::Internal("capabilities are already bound".to_string()))
    }

    pub fn capabilities(&self) -> Option<&CapabilityTable> {
        self.inner.shared.capabilities.get()
    }

    pub fn downgrade(&self) -> WeakRpcEngine {
        WeakRpcEngine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn default_topic(&self) -> &Topic {
        &self.inner.shared.default_topic
    }

    /// Start consuming the default topic.
    pub async fn start(&self) -> Result<(), BusError> {
        let topic = self.default_topic().clone();
        self.subscribe_with_default_request_handler(&topic).await?;
        tracing::info!("[RpcEngine] Started on '{}'", topic);
        Ok(())
    }

    /// Call `rpc` on whoever consumes `to_topic`.
    ///
    /// With `wait_for_response == false` this returns as soon as the request
    /// is published. Otherwise a consumer is ensured on `reply_to_topic` and
    /// the call waits for the response, the context's deadline (or the
    /// engine's request timeout), cancellation, or shutdown.
    pub async fn invoke(
        &self,
        ctx: &CallContext,
        rpc: &str,
        to_topic: &Topic,
        reply_to_topic: &Topic,
        wait_for_response: bool,
        args: Vec<Argument>,
    ) -> InvokeResult {
        if self.inner.shutdown.is_cancelled() {
            return InvokeResult::failed(ErrorCode::Unavailable, "rpc engine is shut down");
        }

        let shared = &self.inner.shared;
        let mut request = RequestEnvelope {
            rpc: rpc.to_string(),
            args,
            reply_to_topic: Some(reply_to_topic.clone()),
            from_topic: shared.default_topic.clone(),
            correlation_id: CorrelationId::generate(),
            response_required: wait_for_response,
        };

        if !wait_for_response {
            return match self.publish_request(to_topic, request).await {
                Ok(()) => InvokeResult::ok(None),
                Err(e) => {
                    tracing::warn!("[RpcEngine] Failed to publish {} to '{}': {}", rpc, to_topic, e);
                    InvokeResult::failed(ErrorCode::Unavailable, e.to_string())
                }
            };
        }

        if let Err(e) = self.subscribe_with_default_request_handler(reply_to_topic).await {
            tracing::warn!("[RpcEngine] Cannot consume reply topic '{}': {}", reply_to_topic, e);
            return InvokeResult::failed(ErrorCode::Unavailable, e.to_string());
        }

        let (tx, rx) = oneshot::channel();
        request.correlation_id = self.register_pending(tx);
        let _guard = PendingGuard {
            shared: shared.as_ref(),
            id: request.correlation_id.clone(),
        };
        let correlation_id = request.correlation_id.clone();

        if let Err(e) = self.publish_request(to_topic, request).await {
            tracing::warn!("[RpcEngine] Failed to publish {} to '{}': {}", rpc, to_topic, e);
            return InvokeResult::failed(ErrorCode::Unavailable, e.to_string());
        }
        tracing::debug!("[RpcEngine] {} -> '{}' ({})", rpc, to_topic, correlation_id);

        let deadline = ctx
            .deadline()
            .unwrap_or_else(|| Instant::now() + shared.request_timeout);
        let cancel = ctx.cancellation_token();

        tokio::select! {
            biased;
            response = rx => match response {
                Ok(response) => response.into(),
                Err(_) => InvokeResult::failed(ErrorCode::Unavailable, "rpc engine is shut down"),
            },
            _ = cancel.cancelled() => {
                tracing::debug!("[RpcEngine] {} ({}) canceled by caller", rpc, correlation_id);
                InvokeResult::failed(ErrorCode::Canceled, format!("{} canceled", rpc))
            }
            _ = self.inner.shutdown.cancelled() => {
                InvokeResult::failed(ErrorCode::Unavailable, "rpc engine is shut down")
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::warn!("[RpcEngine] {} to '{}' timed out ({})", rpc, to_topic, correlation_id);
                InvokeResult::failed(ErrorCode::DeadlineExceeded, format!("{} timed out", rpc))
            }
        }
    }

    /// Consume `topic`, routing requests to the bound capability table.
    /// Subscribing an already consumed topic is a no-op.
    pub async fn subscribe_with_default_request_handler(&self, topic: &Topic) -> Result<(), BusError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(BusError::Unavailable("rpc engine is shut down".to_string()));
        }
        topic.validate()?;

        let mut subscriptions = self.inner.subscriptions.lock().await;
        if subscriptions.contains_key(topic) {
            return Ok(());
        }

        let subscription = self.inner.shared.bus.subscribe(topic).await?;
        let cancel = self.inner.shutdown.child_token();
        subscriptions.insert(
            topic.clone(),
            SubscriptionEntry {
                id: subscription.id(),
                cancel: cancel.clone(),
            },
        );
        drop(subscriptions);

        tokio::spawn(consume(
            self.inner.shared.clone(),
            Arc::downgrade(&self.inner.subscriptions),
            subscription,
            cancel,
        ));
        tracing::info!("[RpcEngine] Subscribed to '{}'", topic);
        Ok(())
    }

    /// Stop consuming `topic`. Requests already being served run to
    /// completion. Unknown topics are ignored.
    pub async fn unsubscribe_from_request_handler(&self, topic: &Topic) -> Result<(), BusError> {
        let entry = self.inner.subscriptions.lock().await.remove(topic);
        let Some(entry) = entry else {
            return Ok(());
        };
        entry.cancel.cancel();
        self.inner.shared.bus.unsubscribe(topic, entry.id).await?;
        tracing::info!("[RpcEngine] Unsubscribed from '{}'", topic);
        Ok(())
    }

    /// Ask the bus to drop `topic`. Failures are logged, never returned.
    pub async fn delete_topic(&self, topic: &Topic) {
        if let Err(e) = self.inner.shared.bus.delete_topic(topic).await {
            tracing::warn!("[RpcEngine] Failed to delete topic '{}': {}", topic, e);
        }
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.shared.pending().len()
    }

    pub async fn is_subscribed(&self, topic: &Topic) -> bool {
        self.inner.subscriptions.lock().await.contains_key(topic)
    }

    pub async fn subscribed_topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.inner.subscriptions.lock().await.keys().cloned().collect();
        topics.sort_by(|a, b| a.name().cmp(b.name()));
        topics
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Stop every consumer loop and fail all waiting calls with
    /// `Unavailable`.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let abandoned = {
            let mut pending = self.inner.shared.pending();
            let count = pending.len();
            pending.clear();
            count
        };

        let subscriptions: Vec<(Topic, SubscriptionEntry)> =
            self.inner.subscriptions.lock().await.drain().collect();
        for (topic, entry) in subscriptions {
            entry.cancel.cancel();
            if let Err(e) = self.inner.shared.bus.unsubscribe(&topic, entry.id).await {
                tracing::debug!("[RpcEngine] Unsubscribe of '{}' during shutdown failed: {}", topic, e);
            }
        }

        tracing::info!(
            "[RpcEngine] Shut down '{}' ({} pending call(s) abandoned)",
            self.inner.shared.default_topic,
            abandoned
        );
    }

    fn register_pending(&self, waiter: Waiter) -> CorrelationId {
        let mut pending = self.inner.shared.pending();
        loop {
            let id = CorrelationId::generate();
            if let Entry::Vacant(slot) = pending.entry(id.clone()) {
                slot.insert(waiter);
                return id;
            }
        }
    }

    async fn publish_request(&self, to_topic: &Topic, request: RequestEnvelope) -> Result<(), BusError> {
        let shared = &self.inner.shared;
        let message = BusMessage::new(
            shared.default_topic.clone(),
            to_topic.clone(),
            MessageBody::Request(request),
        );
        shared.bus.publish(to_topic, message.encode()?).await
    }
}

async fn consume(
    shared: Arc<Shared>,
    registry: Weak<Registry>,
    mut subscription: BusSubscription,
    cancel: CancellationToken,
) {
    let topic = subscription.topic().clone();
    loop {
        let payload = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("[RpcEngine] Consumer for '{}' stopped", topic);
                return;
            }
            payload = subscription.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        let message = match BusMessage::decode(&payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[RpcEngine] Dropping undecodable message on '{}': {}", topic, e);
                continue;
            }
        };

        match message.body {
            MessageBody::Response(response) => shared.resolve(response),
            MessageBody::Request(request) => {
                tokio::spawn(serve_request(shared.clone(), topic.clone(), request));
            }
        }
    }

    // The bus closed the subscription. Drop our registry entry, unless a
    // newer consumer already replaced it, so the topic can be consumed again.
    tracing::info!("[RpcEngine] Bus closed subscription on '{}'", topic);
    let Some(registry) = registry.upgrade() else {
        return;
    };
    let mut subscriptions = registry.lock().await;
    if subscriptions.get(&topic).is_some_and(|e| e.id == subscription.id()) {
        subscriptions.remove(&topic);
    }
}

async fn serve_request(shared: Arc<Shared>, topic: Topic, request: RequestEnvelope) {
    let rpc = request.rpc.clone();
    let correlation_id = request.correlation_id.clone();
    let reply_to = request
        .reply_to_topic
        .clone()
        .filter(|t| !t.is_empty() && request.response_required);

    let response = match shared.capabilities.get().cloned() {
        Some(table) => {
            // Isolated so a panicking handler still produces a response.
            match tokio::spawn(async move { table.dispatch(&request).await }).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("[RpcEngine] Handler for {} failed: {}", rpc, e);
                    ResponseEnvelope::failure(
                        correlation_id,
                        ErrorCode::Internal,
                        format!("{} handler failed", rpc),
                    )
                }
            }
        }
        None => {
            tracing::warn!("[RpcEngine] Request {} on '{}' but no capabilities bound", rpc, topic);
            ResponseEnvelope::failure(correlation_id, ErrorCode::NotFound, format!("{} is not supported", rpc))
        }
    };

    let Some(reply_to) = reply_to else {
        return;
    };
    let message = BusMessage::new(topic, reply_to.clone(), MessageBody::Response(response));
    let result = match message.encode() {
        Ok(bytes) => shared.bus.publish(&reply_to, bytes).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("[RpcEngine] Failed to publish response for {} to '{}': {}", rpc, reply_to, e);
    }
}
