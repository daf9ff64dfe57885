//! In-process message bus.
//!
//! Every subscriber of a topic receives every payload published to it
//! (fan-out). Payloads published to a topic nobody consumes are dropped.
//!
//! Test hooks:
//!   - `set_publish_failure`: make every publish fail with `Unavailable`
//!   - `set_duplicate_delivery`: deliver every payload twice (at-least-once)
//!   - `deleted_topics`: topics for which deletion was requested

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use super::{BusSubscription, MessageBus, SubscriptionId, Topic};
use crate::error::BusError;

struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

struct MemoryBusInner {
    topics: HashMap<Topic, Vec<Subscriber>>,
    next_id: SubscriptionId,
    deleted_topics: Vec<Topic>,
    fail_publish: bool,
    duplicate_delivery: bool,
}

/// Thread-safe in-process bus. Clones share the same topics.
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<RwLock<MemoryBusInner>>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryBusInner {
                topics: HashMap::new(),
                next_id: 1,
                deleted_topics: Vec::new(),
                fail_publish: false,
                duplicate_delivery: false,
            })),
        }
    }

    pub async fn set_publish_failure(&self, fail: bool) {
        self.inner.write().await.fail_publish = fail;
    }

    pub async fn set_duplicate_delivery(&self, duplicate: bool) {
        self.inner.write().await.duplicate_delivery = duplicate;
    }

    /// Number of live consumers on `topic`.
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        let inner = self.inner.read().await;
        inner
            .topics
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    pub async fn deleted_topics(&self) -> Vec<Topic> {
        self.inner.read().await.deleted_topics.clone()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<(), BusError> {
        topic.validate()?;
        let mut inner = self.inner.write().await;
        if inner.fail_publish {
            return Err(BusError::Unavailable(format!("publish to {} refused", topic)));
        }
        let copies = if inner.duplicate_delivery { 2 } else { 1 };

        let Some(subscribers) = inner.topics.get_mut(topic) else {
            tracing::debug!("[MemoryBus] No consumer on {}, dropping payload", topic);
            return Ok(());
        };

        // Consumers that went away without unsubscribing are pruned here.
        subscribers.retain(|s| !s.sender.is_closed());
        for subscriber in subscribers.iter() {
            for _ in 0..copies {
                if subscriber.sender.send(payload.clone()).is_err() {
                    tracing::debug!("[MemoryBus] Consumer {} on {} went away, dropping payload", subscriber.id, topic);
                }
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<BusSubscription, BusError> {
        topic.validate()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .topics
            .entry(topic.clone())
            .or_default()
            .push(Subscriber { id, sender });
        tracing::debug!("[MemoryBus] Subscribed {} (id={})", topic, id);
        Ok(BusSubscription::new(id, topic.clone(), receiver))
    }

    async fn unsubscribe(&self, topic: &Topic, id: SubscriptionId) -> Result<(), BusError> {
        let mut inner = self.inner.write().await;
        if let Some(subscribers) = inner.topics.get_mut(topic) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                inner.topics.remove(topic);
            }
        }
        tracing::debug!("[MemoryBus] Unsubscribed {} (id={})", topic, id);
        Ok(())
    }

    async fn delete_topic(&self, topic: &Topic) -> Result<(), BusError> {
        topic.validate()?;
        let mut inner = self.inner.write().await;
        inner.topics.remove(topic);
        inner.deleted_topics.push(topic.clone());
        Ok(())
    }
}
