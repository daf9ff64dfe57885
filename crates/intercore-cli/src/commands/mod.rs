//! CLI command implementations.
//!
//! Every command runs against an in-process [`Topology`]: one bus, the core
//! engine and, unless disabled, the simulated adapter.

pub mod config;
pub mod rpc;
pub mod serve;
pub mod simulated;

use std::sync::Arc;

use async_trait::async_trait;

use intercore_core::adapter::adapter_capabilities;
use intercore_core::bus::{MemoryBus, Topic};
use intercore_core::error::HandlerError;
use intercore_core::models::{AdapterDescriptor, Alarm, ConnectStatus, OperStatus, PacketIn, Port};
use intercore_core::orchestrator::{core_capabilities, DeviceEventObserver};
use intercore_core::rpc::EngineConfig;
use intercore_core::{CoreConfig, RpcEngine};
use intercore_server::{AppState, AppStateInner};

use self::simulated::SimulatedAdapter;

/// Load the core configuration from `path`, or defaults when no file is given.
pub fn load_config(path: Option<&str>) -> Result<CoreConfig, String> {
    match path {
        Some(path) => CoreConfig::from_yaml_file(path).map_err(|e| format!("Failed to load config: {}", e)),
        None => Ok(CoreConfig::default()),
    }
}

/// Observer that logs what adapters report to the core.
pub struct LoggingObserver;

#[async_trait]
impl DeviceEventObserver for LoggingObserver {
    async fn adapter_registered(&self, adapter: AdapterDescriptor) -> Result<(), HandlerError> {
        tracing::info!("[Core] adapter {} registered ({} {})", adapter.id, adapter.vendor, adapter.version);
        Ok(())
    }

    async fn device_state_changed(
        &self,
        device_id: String,
        oper_status: OperStatus,
        connect_status: ConnectStatus,
    ) -> Result<(), HandlerError> {
        tracing::info!("[Core] device {} is {:?}/{:?}", device_id, oper_status, connect_status);
        Ok(())
    }

    async fn port_created(&self, device_id: String, port: Port) -> Result<(), HandlerError> {
        tracing::info!("[Core] device {} created port {} ({})", device_id, port.port_no, port.label);
        Ok(())
    }

    async fn packet_in(&self, device_id: String, port_no: u32, packet: PacketIn) -> Result<(), HandlerError> {
        tracing::debug!("[Core] packet-in on {}:{} ({} bytes)", device_id, port_no, packet.data.len());
        Ok(())
    }

    async fn alarm(&self, alarm: Alarm) -> Result<(), HandlerError> {
        tracing::warn!("[Core] alarm {} on {}: {:?} {}", alarm.id, alarm.device_id, alarm.severity, alarm.description);
        Ok(())
    }
}

/// The engines of one process, sharing a single in-process bus.
pub struct Topology {
    pub bus: MemoryBus,
    pub core: RpcEngine,
    pub adapter: Option<RpcEngine>,
    pub state: AppState,
}

impl Topology {
    pub async fn start(config: &CoreConfig, with_simulated_adapter: bool) -> Result<Self, String> {
        let bus = MemoryBus::new();

        let core = RpcEngine::new(Arc::new(bus.clone()), config.engine_config());
        core.bind_capabilities(core_capabilities(Arc::new(LoggingObserver)))
            .map_err(|e| e.to_string())?;
        core.start()
            .await
            .map_err(|e| format!("Failed to start core engine: {}", e))?;

        let adapter = if with_simulated_adapter {
            Some(start_simulated_adapter(&bus, config).await?)
        } else {
            None
        };

        Ok(Self {
            bus,
            state: Arc::new(AppStateInner::new(core.clone())),
            core,
            adapter,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(adapter) = &self.adapter {
            adapter.shutdown().await;
        }
        self.core.shutdown().await;
    }
}

async fn start_simulated_adapter(bus: &MemoryBus, config: &CoreConfig) -> Result<RpcEngine, String> {
    let engine = RpcEngine::new(
        Arc::new(bus.clone()),
        EngineConfig {
            default_topic: Topic::new(simulated::ADAPTER_TYPE),
            request_timeout: config.request_timeout(),
        },
    );
    let adapter = Arc::new(SimulatedAdapter::new(
        engine.downgrade(),
        Topic::new(config.core_topic.as_str()),
    ));
    engine
        .bind_capabilities(adapter_capabilities(adapter.clone()))
        .map_err(|e| e.to_string())?;
    engine
        .start()
        .await
        .map_err(|e| format!("Failed to start simulated adapter: {}", e))?;
    adapter
        .register()
        .await
        .map_err(|e| format!("Simulated adapter failed to register: {}", e))?;
    Ok(engine)
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
