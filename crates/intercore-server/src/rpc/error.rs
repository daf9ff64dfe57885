//! Front-door error classes and their JSON-RPC codes.

use serde_json::json;

use intercore_core::rpc::ErrorCode;

use super::types::{self, JsonRpcResponse};

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Canceled: {0}")]
    Canceled(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::NotFound(_) => types::NOT_FOUND,
            RpcError::BadRequest(_) => types::BAD_REQUEST,
            RpcError::Internal(_) => types::INTERNAL_ERROR,
            RpcError::InvalidParams(_) => types::INVALID_PARAMS,
            RpcError::MethodNotFound(_) => types::METHOD_NOT_FOUND,
            RpcError::Canceled(_) => types::CANCELED,
            RpcError::DeadlineExceeded(_) => types::DEADLINE_EXCEEDED,
            RpcError::Unavailable(_) => types::UNAVAILABLE,
        }
    }

    /// Bus-side classification, when this error came back from an adapter call.
    pub fn bus_code(&self) -> Option<ErrorCode> {
        match self {
            RpcError::NotFound(_) => Some(ErrorCode::NotFound),
            RpcError::BadRequest(_) => Some(ErrorCode::InvalidArgument),
            RpcError::Internal(_) => Some(ErrorCode::Internal),
            RpcError::Canceled(_) => Some(ErrorCode::Canceled),
            RpcError::DeadlineExceeded(_) => Some(ErrorCode::DeadlineExceeded),
            RpcError::Unavailable(_) => Some(ErrorCode::Unavailable),
            RpcError::InvalidParams(_) | RpcError::MethodNotFound(_) => None,
        }
    }

    pub fn to_response(&self, id: Option<serde_json::Value>) -> JsonRpcResponse {
        match self.bus_code() {
            Some(code) => JsonRpcResponse::error_with_data(id, self.code(), self.to_string(), json!({ "class": code })),
            None => JsonRpcResponse::error(id, self.code(), self.to_string()),
        }
    }
}

impl From<intercore_core::RpcError> for RpcError {
    fn from(err: intercore_core::RpcError) -> Self {
        use intercore_core::RpcError as Core;
        match err {
            Core::InvalidArgument(msg) => RpcError::BadRequest(msg),
            Core::NotFound(msg) => RpcError::NotFound(msg),
            Core::Internal(msg) => RpcError::Internal(msg),
            Core::Canceled(msg) => RpcError::Canceled(msg),
            Core::DeadlineExceeded(msg) => RpcError::DeadlineExceeded(msg),
            Core::Unavailable(msg) => RpcError::Unavailable(msg),
        }
    }
}
