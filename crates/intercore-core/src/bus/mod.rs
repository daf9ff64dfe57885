//! Message bus seam.
//!
//! The bus is an external collaborator: topic-addressed publish/consume of
//! byte payloads, at-least-once, with no ordering guarantee across topics.
//! `MessageBus` is the only thing the RPC engine assumes about it.
//! `MemoryBus` is the in-process implementation used by the CLI and tests.

pub mod memory;
pub mod topic;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BusError;

pub use memory::MemoryBus;
pub use topic::{create_sub_topic, device_id_from_topic, Topic, DEVICE_ID_LENGTH, TOPIC_SEPARATOR};

/// Identifies one consumer registration on a topic.
pub type SubscriptionId = u64;

/// Receiving side of a topic subscription.
pub struct BusSubscription {
    id: SubscriptionId,
    topic: Topic,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl BusSubscription {
    pub fn new(id: SubscriptionId, topic: Topic, receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { id, topic, receiver }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Next payload, or `None` once the bus dropped this subscription.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish one payload to `topic`.
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<(), BusError>;

    /// Start consuming `topic`. Every call yields an independent subscription.
    async fn subscribe(&self, topic: &Topic) -> Result<BusSubscription, BusError>;

    /// Drop the consumer registered as `id` on `topic`.
    async fn unsubscribe(&self, topic: &Topic, id: SubscriptionId) -> Result<(), BusError>;

    /// Ask the bus to release topic-side resources. Advisory.
    async fn delete_topic(&self, topic: &Topic) -> Result<(), BusError>;
}
