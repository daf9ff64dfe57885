//! Error types for the intercore platform.
//!
//! - `RpcError`: classified failure surfaced to callers of the typed proxies
//! - `BusError`: transport-level failures
//! - `HandlerError`: raised inside the dispatch layer; always turned into a
//!   failure response, never propagated as a transport error
//! - `AdapterError`: domain error reported by an adapter implementation
//! - `PayloadError`: typed payload pack/unpack failures
//! - `ConfigError`: configuration loading and validation

use crate::rpc::envelope::{ErrorCode, ErrorDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Canceled: {0}")]
    Canceled(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl RpcError {
    /// Wire classification of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            RpcError::NotFound(_) => ErrorCode::NotFound,
            RpcError::Internal(_) => ErrorCode::Internal,
            RpcError::Canceled(_) => ErrorCode::Canceled,
            RpcError::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            RpcError::Unavailable(_) => ErrorCode::Unavailable,
        }
    }

    /// Human-readable reason, without the classification prefix.
    pub fn reason(&self) -> &str {
        match self {
            RpcError::InvalidArgument(r)
            | RpcError::NotFound(r)
            | RpcError::Internal(r)
            | RpcError::Canceled(r)
            | RpcError::DeadlineExceeded(r)
            | RpcError::Unavailable(r) => r,
        }
    }

    pub fn from_code(code: ErrorCode, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match code {
            ErrorCode::InvalidArgument => RpcError::InvalidArgument(reason),
            ErrorCode::NotFound => RpcError::NotFound(reason),
            ErrorCode::Internal => RpcError::Internal(reason),
            ErrorCode::Canceled => RpcError::Canceled(reason),
            ErrorCode::DeadlineExceeded => RpcError::DeadlineExceeded(reason),
            ErrorCode::Unavailable => RpcError::Unavailable(reason),
        }
    }
}

impl From<ErrorDescriptor> for RpcError {
    fn from(desc: ErrorDescriptor) -> Self {
        RpcError::from_code(desc.code, desc.reason)
    }
}

impl From<PayloadError> for RpcError {
    fn from(err: PayloadError) -> Self {
        RpcError::Internal(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Invalid topic name: '{0}'")]
    InvalidTopic(String),

    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::Codec(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HandlerError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            HandlerError::NotFound(_) => ErrorCode::NotFound,
            HandlerError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            HandlerError::InvalidArgument(r) | HandlerError::NotFound(r) | HandlerError::Internal(r) => r,
        }
    }
}

impl From<PayloadError> for HandlerError {
    fn from(err: PayloadError) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

/// Domain failure reported by an adapter. The dispatch layer reports it to
/// the caller as `NotFound` carrying `reason`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct AdapterError {
    pub reason: String,
}

impl AdapterError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<AdapterError> for HandlerError {
    fn from(err: AdapterError) -> Self {
        HandlerError::NotFound(err.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("cannot encode payload: {0}")]
    Encode(String),

    #[error("cannot decode payload: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(String),

    #[error("Cannot parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
