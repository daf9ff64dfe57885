//! Core side: driving adapters and serving what they report back.

pub mod adapter_proxy;
pub mod request_handler;

pub use adapter_proxy::AdapterProxy;
pub use request_handler::{core_capabilities, DeviceEventObserver};
