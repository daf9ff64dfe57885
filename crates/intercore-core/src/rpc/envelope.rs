//! Wire envelopes carried as topic payloads.
//!
//! A `BusMessage` wraps either a request or a response. Arguments and results
//! travel as `Any`, a self-describing typed payload (type name + bytes), so
//! the transport never needs to know the schema of a particular RPC.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bus::Topic;
use crate::error::{BusError, PayloadError};

/// A message type that can be carried inside an `Any`.
pub trait TypedMessage: Serialize + DeserializeOwned {
    /// Stable name written next to the encoded bytes.
    const TYPE_NAME: &'static str;
}

/// Self-describing typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Any {
    pub type_name: String,
    pub value: Vec<u8>,
}

impl Any {
    pub fn pack<T: TypedMessage>(message: &T) -> Result<Self, PayloadError> {
        let value = serde_json::to_vec(message).map_err(|e| PayloadError::Encode(e.to_string()))?;
        Ok(Self {
            type_name: T::TYPE_NAME.to_string(),
            value,
        })
    }

    pub fn unpack<T: TypedMessage>(&self) -> Result<T, PayloadError> {
        if !self.is::<T>() {
            return Err(PayloadError::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                found: self.type_name.clone(),
            });
        }
        serde_json::from_slice(&self.value).map_err(|e| PayloadError::Decode(e.to_string()))
    }

    pub fn is<T: TypedMessage>(&self) -> bool {
        self.type_name == T::TYPE_NAME
    }
}

/// A named, typed request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub key: String,
    pub value: Any,
}

impl Argument {
    pub fn new<T: TypedMessage>(key: impl Into<String>, value: &T) -> Result<Self, PayloadError> {
        Ok(Self {
            key: key.into(),
            value: Any::pack(value)?,
        })
    }
}

/// Pairs a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Failure classes carried in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
    Canceled,
    DeadlineExceeded,
    Unavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
            Self::Canceled => "CANCELED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub code: ErrorCode,
    pub reason: String,
}

impl TypedMessage for ErrorDescriptor {
    const TYPE_NAME: &'static str = "intercore.Error";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub rpc: String,
    #[serde(default)]
    pub args: Vec<Argument>,
    /// Where the response (and later unsolicited messages) should go.
    pub reply_to_topic: Option<Topic>,
    pub from_topic: Topic,
    pub correlation_id: CorrelationId,
    pub response_required: bool,
}

impl RequestEnvelope {
    pub fn arg_keys(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub correlation_id: CorrelationId,
    pub success: bool,
    /// Result on success (possibly empty); packed `ErrorDescriptor` on failure.
    pub result: Option<Any>,
}

impl ResponseEnvelope {
    pub fn success(correlation_id: CorrelationId, result: Option<Any>) -> Self {
        Self {
            correlation_id,
            success: true,
            result,
        }
    }

    pub fn failure(correlation_id: CorrelationId, code: ErrorCode, reason: impl Into<String>) -> Self {
        let descriptor = ErrorDescriptor {
            code,
            reason: reason.into(),
        };
        Self {
            correlation_id,
            success: false,
            result: Any::pack(&descriptor).ok(),
        }
    }

    /// The error carried by a failed response, if it can be decoded.
    pub fn error(&self) -> Option<ErrorDescriptor> {
        if self.success {
            return None;
        }
        self.result.as_ref().and_then(|r| r.unpack().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub id: String,
    pub from_topic: Topic,
    pub to_topic: Topic,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "envelope", rename_all = "lowercase")]
pub enum MessageBody {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
}

/// The unit actually published on a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub header: MessageHeader,
    pub body: MessageBody,
}

impl BusMessage {
    pub fn new(from_topic: Topic, to_topic: Topic, body: MessageBody) -> Self {
        Self {
            header: MessageHeader {
                id: uuid::Uuid::new_v4().to_string(),
                from_topic,
                to_topic,
                timestamp: Utc::now(),
            },
            body,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, BusError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, BusError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
