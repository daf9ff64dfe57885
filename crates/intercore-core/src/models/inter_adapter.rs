use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rpc::envelope::{Any, TypedMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterAdapterMessageType {
    FlowRequest,
    FlowResponse,
    OmciRequest,
    OmciResponse,
    MetricsRequest,
    MetricsResponse,
    OnuIndRequest,
    OnuIndResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterAdapterHeader {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: InterAdapterMessageType,
    pub from_topic: String,
    pub to_topic: String,
    pub to_device_id: String,
    #[serde(default)]
    pub proxy_device_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A message relayed through the core from one adapter to another
/// (e.g. OLT adapter ↔ ONU adapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterAdapterMessage {
    pub header: InterAdapterHeader,
    pub body: Any,
}

impl TypedMessage for InterAdapterMessage {
    const TYPE_NAME: &'static str = "intercore.InterAdapterMessage";
}
