//! Capability table the core serves for adapters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::models::{AdapterDescriptor, Alarm, ConnectStatus, IntType, OperStatus, PacketIn, Port, StrType};
use crate::rpc::dispatch::{Args, CapabilityTable, FromArgs, HandlerResult};
use crate::rpc::envelope::Argument;
use crate::rpc::names::*;

/// Receives what adapters report to the core. One method per callback.
#[async_trait]
pub trait DeviceEventObserver: Send + Sync {
    async fn adapter_registered(&self, adapter: AdapterDescriptor) -> Result<(), HandlerError>;

    async fn device_state_changed(
        &self,
        device_id: String,
        oper_status: OperStatus,
        connect_status: ConnectStatus,
    ) -> Result<(), HandlerError>;

    async fn port_created(&self, device_id: String, port: Port) -> Result<(), HandlerError>;

    async fn packet_in(&self, device_id: String, port_no: u32, packet: PacketIn) -> Result<(), HandlerError>;

    async fn alarm(&self, alarm: Alarm) -> Result<(), HandlerError>;
}

pub struct RegisterArgs {
    pub adapter: AdapterDescriptor,
}

impl FromArgs for RegisterArgs {
    const KEYS: &'static [&'static str] = &[KEY_ADAPTER];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(1)?;
        Ok(Self {
            adapter: args.get(KEY_ADAPTER)?,
        })
    }
}

pub struct DeviceStateArgs {
    pub device_id: StrType,
    pub oper_status: OperStatus,
    pub connect_status: ConnectStatus,
}

impl FromArgs for DeviceStateArgs {
    const KEYS: &'static [&'static str] = &[KEY_DEVICE_ID, KEY_OPER_STATUS, KEY_CONNECT_STATUS];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(3)?;
        Ok(Self {
            device_id: args.get(KEY_DEVICE_ID)?,
            oper_status: args.get(KEY_OPER_STATUS)?,
            connect_status: args.get(KEY_CONNECT_STATUS)?,
        })
    }
}

pub struct PortCreatedArgs {
    pub device_id: StrType,
    pub port: Port,
}

impl FromArgs for PortCreatedArgs {
    const KEYS: &'static [&'static str] = &[KEY_DEVICE_ID, KEY_PORT];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(2)?;
        Ok(Self {
            device_id: args.get(KEY_DEVICE_ID)?,
            port: args.get(KEY_PORT)?,
        })
    }
}

pub struct PacketInArgs {
    pub device_id: StrType,
    pub port: IntType,
    pub packet: PacketIn,
}

impl FromArgs for PacketInArgs {
    const KEYS: &'static [&'static str] = &[KEY_DEVICE_ID, KEY_PORT, KEY_PACKET];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(3)?;
        Ok(Self {
            device_id: args.get(KEY_DEVICE_ID)?,
            port: args.get(KEY_PORT)?,
            packet: args.get(KEY_PACKET)?,
        })
    }
}

pub struct AlarmArgs {
    pub alarm: Alarm,
}

impl FromArgs for AlarmArgs {
    const KEYS: &'static [&'static str] = &[KEY_ALARM];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(1)?;
        Ok(Self {
            alarm: args.get(KEY_ALARM)?,
        })
    }
}

/// Build the table the core serves on its default topic and on every
/// device reply topic.
pub fn core_capabilities(observer: Arc<dyn DeviceEventObserver>) -> CapabilityTable {
    let register = observer.clone();
    let state = observer.clone();
    let port = observer.clone();
    let packet = observer.clone();
    let alarm = observer;

    CapabilityTable::builder()
        .handle(REGISTER, move |p: RegisterArgs| on_register(register.clone(), p))
        .handle(DEVICE_STATE_UPDATE, move |p: DeviceStateArgs| {
            on_device_state_update(state.clone(), p)
        })
        .handle(PORT_CREATED, move |p: PortCreatedArgs| on_port_created(port.clone(), p))
        .handle(PACKET_IN, move |p: PacketInArgs| on_packet_in(packet.clone(), p))
        .handle(DEVICE_ALARM, move |p: AlarmArgs| on_alarm(alarm.clone(), p))
        .build()
}

async fn on_register(observer: Arc<dyn DeviceEventObserver>, p: RegisterArgs) -> HandlerResult {
    tracing::info!("[CoreHandler] Adapter {} registered", p.adapter.id);
    observer.adapter_registered(p.adapter).await?;
    Ok(None)
}

async fn on_device_state_update(observer: Arc<dyn DeviceEventObserver>, p: DeviceStateArgs) -> HandlerResult {
    observer
        .device_state_changed(p.device_id.val, p.oper_status, p.connect_status)
        .await?;
    Ok(None)
}

async fn on_port_created(observer: Arc<dyn DeviceEventObserver>, p: PortCreatedArgs) -> HandlerResult {
    observer.port_created(p.device_id.val, p.port).await?;
    Ok(None)
}

async fn on_packet_in(observer: Arc<dyn DeviceEventObserver>, p: PacketInArgs) -> HandlerResult {
    let port_no = u32::try_from(p.port.val)
        .map_err(|_| HandlerError::InvalidArgument(format!("port {} out of range", p.port.val)))?;
    observer.packet_in(p.device_id.val, port_no, p.packet).await?;
    Ok(None)
}

async fn on_alarm(observer: Arc<dyn DeviceEventObserver>, p: AlarmArgs) -> HandlerResult {
    observer.alarm(p.alarm).await?;
    Ok(None)
}
