//! Adapter side: the `Adapter` trait device families implement, the
//! capability table that exposes it on the bus, and the proxy used to call
//! back into the core.

pub mod core_proxy;
pub mod request_handler;

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::models::{Device, InterAdapterMessage, PortCapability, SwitchCapability};

pub use core_proxy::CoreProxy;
pub use request_handler::adapter_capabilities;

/// Device-family specific behaviour behind the adapter capability table.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn adopt_device(&self, device: &Device) -> Result<(), AdapterError>;

    async fn get_ofp_device_info(&self, device: &Device) -> Result<SwitchCapability, AdapterError>;

    async fn get_ofp_port_info(&self, device: &Device, port_no: i64) -> Result<PortCapability, AdapterError>;

    async fn process_inter_adapter_message(&self, message: &InterAdapterMessage) -> Result<(), AdapterError>;
}
