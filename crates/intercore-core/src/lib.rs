//! Intercore Core: request/response RPC over a publish/subscribe message bus.
//!
//! The core orchestrator and every device adapter talk to each other only
//! through named topics on a message bus. This crate fabricates synchronous
//! call semantics on top of that transport:
//!
//! - `bus`: topic addressing, the `MessageBus` seam and an in-process bus
//! - `rpc`: envelopes, the `RpcEngine` (correlation, timeouts, consumer
//!   loops) and the name-keyed `CapabilityTable` dispatch layer
//! - `adapter`: adapter-side capability table and the adapter→core proxy
//! - `orchestrator`: core-side capability table and the core→adapter proxy
//! - `models`: device, OpenFlow and inter-adapter payload types
//!
//! # Architecture
//!
//! ```text
//! AdapterProxy ──► RpcEngine::invoke ──► bus (to_topic)
//!                                            │
//!                         remote RpcEngine consumer loop
//!                                            │
//!                              CapabilityTable::dispatch
//!                                            │
//! pending call resolved ◄── bus (reply_to_topic) ◄── ResponseEnvelope
//! ```

pub mod adapter;
pub mod bus;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod rpc;

// Convenience re-exports
pub use bus::{MemoryBus, MessageBus, Topic};
pub use config::CoreConfig;
pub use error::{AdapterError, BusError, HandlerError, RpcError};
pub use rpc::{CallContext, CapabilityTable, InvokeResult, RpcEngine};
