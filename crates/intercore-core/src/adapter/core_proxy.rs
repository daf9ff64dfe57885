use crate::bus::{create_sub_topic, Topic};
use crate::error::RpcError;
use crate::models::{AdapterDescriptor, Alarm, ConnectStatus, IntType, OperStatus, PacketIn, Port, StrType};
use crate::rpc::envelope::Argument;
use crate::rpc::names::*;
use crate::rpc::{CallContext, RpcEngine};

/// Typed client an adapter uses to reach the core.
#[derive(Clone)]
pub struct CoreProxy {
    engine: RpcEngine,
    core_topic: Topic,
}

impl CoreProxy {
    pub fn new(engine: RpcEngine, core_topic: Topic) -> Self {
        Self { engine, core_topic }
    }

    pub fn core_topic(&self) -> &Topic {
        &self.core_topic
    }

    /// Announce this adapter to the core.
    pub async fn register_adapter(&self, ctx: &CallContext, adapter: &AdapterDescriptor) -> Result<(), RpcError> {
        tracing::info!("[CoreProxy] Registering adapter {}", adapter.id);
        let args = vec![Argument::new(KEY_ADAPTER, adapter)?];
        self.call(ctx, REGISTER, &self.core_topic, args).await
    }

    pub async fn device_state_update(
        &self,
        ctx: &CallContext,
        device_id: &str,
        oper_status: OperStatus,
        connect_status: ConnectStatus,
    ) -> Result<(), RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE_ID, &StrType { val: device_id.to_string() })?,
            Argument::new(KEY_OPER_STATUS, &oper_status)?,
            Argument::new(KEY_CONNECT_STATUS, &connect_status)?,
        ];
        self.call(ctx, DEVICE_STATE_UPDATE, &self.core_topic, args).await
    }

    pub async fn port_created(&self, ctx: &CallContext, device_id: &str, port: &Port) -> Result<(), RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE_ID, &StrType { val: device_id.to_string() })?,
            Argument::new(KEY_PORT, port)?,
        ];
        self.call(ctx, PORT_CREATED, &self.core_topic, args).await
    }

    /// Forward a packet received on a device port. Fire-and-forget, on the
    /// device's reply topic.
    pub async fn send_packet_in(
        &self,
        ctx: &CallContext,
        device_id: &str,
        port_no: u32,
        packet: &PacketIn,
    ) -> Result<(), RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE_ID, &StrType { val: device_id.to_string() })?,
            Argument::new(KEY_PORT, &IntType { val: i64::from(port_no) })?,
            Argument::new(KEY_PACKET, packet)?,
        ];
        self.notify(ctx, PACKET_IN, device_id, args).await
    }

    /// Raise or clear an alarm. Fire-and-forget, on the device's reply topic.
    pub async fn send_alarm(&self, ctx: &CallContext, alarm: &Alarm) -> Result<(), RpcError> {
        let args = vec![Argument::new(KEY_ALARM, alarm)?];
        self.notify(ctx, DEVICE_ALARM, &alarm.device_id, args).await
    }

    async fn call(&self, ctx: &CallContext, rpc: &str, to: &Topic, args: Vec<Argument>) -> Result<(), RpcError> {
        let reply_to = self.engine.default_topic().clone();
        self.engine
            .invoke(ctx, rpc, to, &reply_to, true, args)
            .await
            .into_result()
            .map(|_| ())
    }

    async fn notify(&self, ctx: &CallContext, rpc: &str, device_id: &str, args: Vec<Argument>) -> Result<(), RpcError> {
        let to = create_sub_topic(&[self.core_topic.name(), device_id]);
        let reply_to = self.engine.default_topic().clone();
        tracing::debug!("[CoreProxy] {} -> '{}'", rpc, to);
        self.engine
            .invoke(ctx, rpc, &to, &reply_to, false, args)
            .await
            .into_result()
            .map(|_| ())
    }
}
