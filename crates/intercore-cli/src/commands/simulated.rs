//! A device adapter that needs no hardware.
//!
//! Adopting a device opens its `<type>_<id>` topic and reports the device as
//! active and reachable, with one NNI port, back to the core.

use async_trait::async_trait;

use intercore_core::adapter::{Adapter, CoreProxy};
use intercore_core::bus::Topic;
use intercore_core::error::AdapterError;
use intercore_core::models::*;
use intercore_core::orchestrator::AdapterProxy;
use intercore_core::rpc::WeakRpcEngine;
use intercore_core::{CallContext, RpcError};

pub const ADAPTER_TYPE: &str = "simulated_olt";
const NNI_PORT: u32 = 1;

/// Holds its engine weakly: the engine's capability table owns the adapter.
#[derive(Clone)]
pub struct SimulatedAdapter {
    engine: WeakRpcEngine,
    core_topic: Topic,
}

impl SimulatedAdapter {
    pub fn new(engine: WeakRpcEngine, core_topic: Topic) -> Self {
        Self { engine, core_topic }
    }

    fn core(&self) -> Result<CoreProxy, RpcError> {
        let engine = self
            .engine
            .upgrade()
            .ok_or_else(|| RpcError::Unavailable("simulated adapter engine is gone".to_string()))?;
        Ok(CoreProxy::new(engine, self.core_topic.clone()))
    }

    pub fn descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            id: ADAPTER_TYPE.to_string(),
            vendor: "intercore".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            device_types: vec![ADAPTER_TYPE.to_string()],
        }
    }

    /// Announce the adapter to the core.
    pub async fn register(&self) -> Result<(), RpcError> {
        self.core()?
            .register_adapter(&CallContext::new(), &Self::descriptor())
            .await
    }

    async fn report_active(&self, device: &Device) -> Result<(), RpcError> {
        let ctx = CallContext::new();
        let core = self.core()?;
        core.device_state_update(&ctx, &device.id, OperStatus::Active, ConnectStatus::Reachable)
            .await?;
        let nni = Port {
            port_no: NNI_PORT,
            label: "nni-1".to_string(),
            port_type: PortType::EthernetNni,
            device_id: device.id.clone(),
            admin_state: AdminState::Enabled,
            oper_status: OperStatus::Active,
        };
        core.port_created(&ctx, &device.id, &nni).await
    }
}

#[async_trait]
impl Adapter for SimulatedAdapter {
    async fn adopt_device(&self, device: &Device) -> Result<(), AdapterError> {
        let engine = self
            .engine
            .upgrade()
            .ok_or_else(|| AdapterError::new("simulated adapter is shutting down"))?;
        engine
            .subscribe_with_default_request_handler(&AdapterProxy::device_topic(device))
            .await
            .map_err(|e| AdapterError::new(e.to_string()))?;
        tracing::info!("[SimulatedAdapter] adopted {}", device.id);

        // Reports travel on their own task so adoption answers immediately.
        let reporter = self.clone();
        let device = device.clone();
        tokio::spawn(async move {
            if let Err(e) = reporter.report_active(&device).await {
                tracing::warn!("[SimulatedAdapter] state report for {} failed: {}", device.id, e);
            }
        });
        Ok(())
    }

    async fn get_ofp_device_info(&self, device: &Device) -> Result<SwitchCapability, AdapterError> {
        Ok(SwitchCapability {
            desc: SwitchDescription {
                mfr_desc: "intercore".to_string(),
                hw_desc: "simulated".to_string(),
                sw_desc: env!("CARGO_PKG_VERSION").to_string(),
                serial_num: device.serial_number.clone().unwrap_or_else(|| device.id.clone()),
                dp_desc: device.id.clone(),
            },
            switch_features: SwitchFeatures {
                n_buffers: 256,
                n_tables: 2,
                capabilities: 0,
            },
        })
    }

    async fn get_ofp_port_info(&self, device: &Device, port_no: i64) -> Result<PortCapability, AdapterError> {
        let port_no = u32::try_from(port_no)
            .map_err(|_| AdapterError::new(format!("port {} does not exist on {}", port_no, device.id)))?;
        let name = if port_no == NNI_PORT {
            "nni-1".to_string()
        } else {
            format!("uni-{}", port_no)
        };
        Ok(PortCapability {
            port: OfpPort {
                port_no,
                hw_addr: format!("00:00:00:00:00:{:02x}", port_no & 0xff),
                name,
                curr_speed: 1_000_000,
                max_speed: 1_000_000,
                ..OfpPort::default()
            },
        })
    }

    async fn process_inter_adapter_message(&self, message: &InterAdapterMessage) -> Result<(), AdapterError> {
        tracing::info!(
            "[SimulatedAdapter] inter-adapter message {} from {} for {}",
            message.header.id,
            message.header.from_topic,
            message.header.to_device_id
        );
        Ok(())
    }
}
