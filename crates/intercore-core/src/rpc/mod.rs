//! Request/response RPC on top of the message bus.

pub mod dispatch;
pub mod engine;
pub mod envelope;
pub mod names;

pub use dispatch::{Args, CapabilityTable, CapabilityTableBuilder, FromArgs, HandlerFuture, HandlerResult};
pub use engine::{CallContext, EngineConfig, InvokeResult, RpcEngine, WeakRpcEngine};
pub use envelope::{
    Any, Argument, BusMessage, CorrelationId, ErrorCode, ErrorDescriptor, MessageBody, RequestEnvelope,
    ResponseEnvelope, TypedMessage,
};
