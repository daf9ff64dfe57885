//! RPC methods that drive device adapters through the core's adapter proxy.
//!
//! Methods:
//! - `devices.adopt`                  open the device's reply topic and hand it to its adapter
//! - `devices.disable` / `devices.reenable` / `devices.reboot`
//! - `devices.delete`                 call the adapter, then tear down the reply topic
//! - `devices.ofpInfo` / `devices.portInfo`
//! - `devices.updateFlowsBulk` / `devices.updateFlowsIncremental`
//! - `devices.packetOut`              fire-and-forget
//!
//! Every method accepts an optional `timeoutMs` bounding the adapter call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use intercore_core::models::{
    Device, FlowChanges, FlowGroupChanges, FlowGroups, Flows, PacketOut, PortCapability, SwitchCapability,
};
use intercore_core::CallContext;

use crate::rpc::error::RpcError;
use crate::state::AppState;

fn call_context(timeout_ms: Option<u64>) -> CallContext {
    match timeout_ms {
        Some(ms) => CallContext::with_timeout(Duration::from_millis(ms)),
        None => CallContext::new(),
    }
}

fn require_identity(device: &Device) -> Result<(), RpcError> {
    if device.id.is_empty() {
        return Err(RpcError::InvalidParams("device.id must not be empty".into()));
    }
    if device.device_type.is_empty() {
        return Err(RpcError::InvalidParams("device.type must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAck {
    pub device_id: String,
    pub ok: bool,
}

impl DeviceAck {
    fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            ok: true,
        }
    }
}

// ---------------------------------------------------------------------------
// single-device lifecycle calls
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceParams {
    pub device: Device,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Adopt,
    Disable,
    Reenable,
    Reboot,
    Delete,
}

impl Lifecycle {
    fn verb(&self) -> &'static str {
        match self {
            Lifecycle::Adopt => "adopt",
            Lifecycle::Disable => "disable",
            Lifecycle::Reenable => "reenable",
            Lifecycle::Reboot => "reboot",
            Lifecycle::Delete => "delete",
        }
    }
}

pub async fn lifecycle(state: &AppState, action: Lifecycle, params: DeviceParams) -> Result<DeviceAck, RpcError> {
    require_identity(&params.device)?;
    let ctx = call_context(params.timeout_ms);
    let proxy = &state.adapter_proxy;
    let device = &params.device;

    tracing::info!("[DevicesRpc] {} device {} ({})", action.verb(), device.id, device.device_type);
    match action {
        Lifecycle::Adopt => proxy.adopt_device(&ctx, device).await?,
        Lifecycle::Disable => proxy.disable_device(&ctx, device).await?,
        Lifecycle::Reenable => proxy.reenable_device(&ctx, device).await?,
        Lifecycle::Reboot => proxy.reboot_device(&ctx, device).await?,
        Lifecycle::Delete => proxy.delete_device(&ctx, device).await?,
    }
    Ok(DeviceAck::new(&device.id))
}

// ---------------------------------------------------------------------------
// devices.ofpInfo / devices.portInfo
// ---------------------------------------------------------------------------

pub async fn ofp_info(state: &AppState, params: DeviceParams) -> Result<SwitchCapability, RpcError> {
    require_identity(&params.device)?;
    let ctx = call_context(params.timeout_ms);
    Ok(state.adapter_proxy.get_ofp_device_info(&ctx, &params.device).await?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfoParams {
    pub device: Device,
    pub port_no: u32,
    pub timeout_ms: Option<u64>,
}

pub async fn port_info(state: &AppState, params: PortInfoParams) -> Result<PortCapability, RpcError> {
    require_identity(&params.device)?;
    let ctx = call_context(params.timeout_ms);
    Ok(state
        .adapter_proxy
        .get_ofp_port_info(&ctx, &params.device, params.port_no)
        .await?)
}

// ---------------------------------------------------------------------------
// flow updates
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowsBulkParams {
    pub device: Device,
    #[serde(default)]
    pub flows: Flows,
    #[serde(default)]
    pub groups: FlowGroups,
    pub timeout_ms: Option<u64>,
}

pub async fn update_flows_bulk(state: &AppState, params: FlowsBulkParams) -> Result<DeviceAck, RpcError> {
    require_identity(&params.device)?;
    let ctx = call_context(params.timeout_ms);
    state
        .adapter_proxy
        .update_flows_bulk(&ctx, &params.device, &params.flows, &params.groups)
        .await?;
    Ok(DeviceAck::new(&params.device.id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowsIncrementalParams {
    pub device: Device,
    #[serde(default)]
    pub flow_changes: FlowChanges,
    #[serde(default)]
    pub group_changes: FlowGroupChanges,
    pub timeout_ms: Option<u64>,
}

pub async fn update_flows_incremental(
    state: &AppState,
    params: FlowsIncrementalParams,
) -> Result<DeviceAck, RpcError> {
    require_identity(&params.device)?;
    let ctx = call_context(params.timeout_ms);
    state
        .adapter_proxy
        .update_flows_incremental(&ctx, &params.device, &params.flow_changes, &params.group_changes)
        .await?;
    Ok(DeviceAck::new(&params.device.id))
}

// ---------------------------------------------------------------------------
// devices.packetOut
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketOutParams {
    pub device_type: String,
    pub device_id: String,
    pub out_port: u32,
    #[serde(default)]
    pub packet: PacketOut,
}

pub async fn packet_out(state: &AppState, params: PacketOutParams) -> Result<DeviceAck, RpcError> {
    if params.device_id.is_empty() || params.device_type.is_empty() {
        return Err(RpcError::InvalidParams("deviceType and deviceId are required".into()));
    }
    state
        .adapter_proxy
        .packet_out(
            &CallContext::new(),
            &params.device_type,
            &params.device_id,
            params.out_port,
            &params.packet,
        )
        .await?;
    Ok(DeviceAck::new(&params.device_id))
}
