//! Typed client the core uses to drive adapters.
//!
//! Adoption is addressed to the adapter family's topic (`device.device_type`);
//! everything after that goes to the device-scoped topic
//! `<device_type>_<device_id>` the adapter opens when it adopts. Responses and
//! later unsolicited messages come back on `<core_topic>_<device_id>`, which
//! is subscribed before the adoption call and dropped after deletion.

use crate::bus::{create_sub_topic, Topic};
use crate::error::RpcError;
use crate::models::{
    Device, FlowChanges, FlowGroupChanges, FlowGroups, Flows, IntType, InterAdapterMessage, PacketOut,
    PortCapability, StrType, SwitchCapability,
};
use crate::rpc::envelope::Argument;
use crate::rpc::names::*;
use crate::rpc::{CallContext, InvokeResult, RpcEngine};

#[derive(Clone)]
pub struct AdapterProxy {
    engine: RpcEngine,
}

impl AdapterProxy {
    pub fn new(engine: RpcEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RpcEngine {
        &self.engine
    }

    /// Topic the adapter consumes for `device` once adopted.
    pub fn device_topic(device: &Device) -> Topic {
        create_sub_topic(&[device.device_type.as_str(), device.id.as_str()])
    }

    /// Topic responses and unsolicited messages for `device_id` arrive on.
    pub fn reply_topic(&self, device_id: &str) -> Topic {
        create_sub_topic(&[self.engine.default_topic().name(), device_id])
    }

    pub async fn adopt_device(&self, ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        tracing::debug!("[AdapterProxy] adopt_device {}", device.id);
        let to = Topic::new(device.device_type.as_str());
        let reply_to = self.reply_topic(&device.id);

        // Must exist before the adapter can push anything for this device.
        self.engine
            .subscribe_with_default_request_handler(&reply_to)
            .await
            .map_err(|e| {
                tracing::error!("[AdapterProxy] Cannot subscribe to '{}': {}", reply_to, e);
                RpcError::Unavailable(e.to_string())
            })?;

        let args = vec![Argument::new(KEY_DEVICE, device)?];
        let result = self.engine.invoke(ctx, ADOPT_DEVICE, &to, &reply_to, true, args).await;
        tracing::debug!(
            "[AdapterProxy] adopt_device {} -> success={}",
            device.id,
            result.success
        );
        unit(result)
    }

    pub async fn disable_device(&self, ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        self.device_call(ctx, DISABLE_DEVICE, device).await.and_then(unit)
    }

    pub async fn reenable_device(&self, ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        self.device_call(ctx, REENABLE_DEVICE, device).await.and_then(unit)
    }

    pub async fn reboot_device(&self, ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        self.device_call(ctx, REBOOT_DEVICE, device).await.and_then(unit)
    }

    /// Delete `device` on its adapter, then stop consuming and drop its
    /// reply topic whatever the adapter answered.
    pub async fn delete_device(&self, ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        let result = self.device_call(ctx, DELETE_DEVICE, device).await;

        let reply_to = self.reply_topic(&device.id);
        self.engine
            .unsubscribe_from_request_handler(&reply_to)
            .await
            .map_err(|e| {
                tracing::error!("[AdapterProxy] Cannot unsubscribe from '{}': {}", reply_to, e);
                RpcError::Unavailable(e.to_string())
            })?;
        self.engine.delete_topic(&reply_to).await;

        result.and_then(unit)
    }

    pub async fn get_ofp_device_info(&self, ctx: &CallContext, device: &Device) -> Result<SwitchCapability, RpcError> {
        self.device_call(ctx, GET_OFP_DEVICE_INFO, device).await?.unpack()
    }

    pub async fn get_ofp_port_info(
        &self,
        ctx: &CallContext,
        device: &Device,
        port_no: u32,
    ) -> Result<PortCapability, RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE, device)?,
            Argument::new(KEY_PORT_NO, &IntType { val: i64::from(port_no) })?,
        ];
        self.scoped(ctx, GET_OFP_PORT_INFO, device, args).await.unpack()
    }

    /// Relay a message to the adapter named in its header, scoped to the
    /// target device.
    pub async fn process_inter_adapter_message(
        &self,
        ctx: &CallContext,
        message: &InterAdapterMessage,
    ) -> Result<(), RpcError> {
        let header = &message.header;
        let to = create_sub_topic(&[header.to_topic.as_str(), header.to_device_id.as_str()]);
        let reply_to = self.reply_topic(&header.to_device_id);
        let args = vec![Argument::new(KEY_MESSAGE, message)?];
        unit(
            self.engine
                .invoke(ctx, PROCESS_INTER_ADAPTER_MESSAGE, &to, &reply_to, true, args)
                .await,
        )
    }

    pub async fn update_flows_bulk(
        &self,
        ctx: &CallContext,
        device: &Device,
        flows: &Flows,
        groups: &FlowGroups,
    ) -> Result<(), RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE, device)?,
            Argument::new(KEY_FLOWS, flows)?,
            Argument::new(KEY_GROUPS, groups)?,
        ];
        unit(self.scoped(ctx, UPDATE_FLOWS_BULK, device, args).await)
    }

    pub async fn update_flows_incremental(
        &self,
        ctx: &CallContext,
        device: &Device,
        flow_changes: &FlowChanges,
        group_changes: &FlowGroupChanges,
    ) -> Result<(), RpcError> {
        let args = vec![
            Argument::new(KEY_DEVICE, device)?,
            Argument::new(KEY_FLOW_CHANGES, flow_changes)?,
            Argument::new(KEY_GROUP_CHANGES, group_changes)?,
        ];
        unit(self.scoped(ctx, UPDATE_FLOWS_INCREMENTALLY, device, args).await)
    }

    /// Send a packet out of a device port. Does not wait for the adapter.
    pub async fn packet_out(
        &self,
        ctx: &CallContext,
        device_type: &str,
        device_id: &str,
        out_port: u32,
        packet: &PacketOut,
    ) -> Result<(), RpcError> {
        let to = create_sub_topic(&[device_type, device_id]);
        let reply_to = self.reply_topic(device_id);
        let args = vec![
            Argument::new(KEY_DEVICE_ID_CAMEL, &StrType { val: device_id.to_string() })?,
            Argument::new(KEY_OUT_PORT, &IntType { val: i64::from(out_port) })?,
            Argument::new(KEY_PACKET, packet)?,
        ];
        unit(
            self.engine
                .invoke(ctx, RECEIVE_PACKET_OUT, &to, &reply_to, false, args)
                .await,
        )
    }

    // Not wired to adapters yet; acknowledged locally.

    pub async fn reconcile_device(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(RECONCILE_DEVICE, device)
    }

    pub async fn abandon_device(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(ABANDON_DEVICE, device)
    }

    pub async fn get_device_details(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(GET_DEVICE_DETAILS, device)
    }

    pub async fn self_test_device(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(SELF_TEST_DEVICE, device)
    }

    pub async fn update_pm_config(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(UPDATE_PM_CONFIG, device)
    }

    pub async fn suppress_alarm(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(SUPPRESS_ALARM, device)
    }

    pub async fn unsuppress_alarm(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(UNSUPPRESS_ALARM, device)
    }

    pub async fn download_image(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(DOWNLOAD_IMAGE, device)
    }

    pub async fn get_image_download_status(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(GET_IMAGE_DOWNLOAD_STATUS, device)
    }

    pub async fn cancel_image_download(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(CANCEL_IMAGE_DOWNLOAD, device)
    }

    pub async fn activate_image_update(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(ACTIVATE_IMAGE_UPDATE, device)
    }

    pub async fn revert_image_update(&self, _ctx: &CallContext, device: &Device) -> Result<(), RpcError> {
        not_wired(REVERT_IMAGE_UPDATE, device)
    }

    async fn device_call(&self, ctx: &CallContext, rpc: &str, device: &Device) -> Result<InvokeResult, RpcError> {
        let args = vec![Argument::new(KEY_DEVICE, device)?];
        Ok(self.scoped(ctx, rpc, device, args).await)
    }

    async fn scoped(&self, ctx: &CallContext, rpc: &str, device: &Device, args: Vec<Argument>) -> InvokeResult {
        let to = Self::device_topic(device);
        let reply_to = self.reply_topic(&device.id);
        let result = self.engine.invoke(ctx, rpc, &to, &reply_to, true, args).await;
        tracing::debug!(
            "[AdapterProxy] {} {} -> success={}",
            rpc,
            device.id,
            result.success
        );
        result
    }
}

fn unit(result: InvokeResult) -> Result<(), RpcError> {
    result.into_result().map(|_| ())
}

fn not_wired(rpc: &str, device: &Device) -> Result<(), RpcError> {
    tracing::debug!("[AdapterProxy] {} for {} acknowledged locally", rpc, device.id);
    Ok(())
}
