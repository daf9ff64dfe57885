//! Capability table an adapter serves on its topics.
//!
//! Only adoption, OpenFlow info and inter-adapter messaging reach the
//! `Adapter`. Every other capability is a stub that acknowledges with an
//! empty payload, so callers of not-yet-implemented operations see success.

use std::sync::Arc;

use crate::error::HandlerError;
use crate::models::{Device, IntType, InterAdapterMessage};
use crate::rpc::dispatch::{Args, CapabilityTable, FromArgs, HandlerResult};
use crate::rpc::envelope::{Any, Argument};
use crate::rpc::names::*;

use super::Adapter;

const STUBS: &[&str] = &[
    ADAPTER_DESCRIPTOR,
    DEVICE_TYPES,
    HEALTH,
    RECONCILE_DEVICE,
    ABANDON_DEVICE,
    DISABLE_DEVICE,
    REENABLE_DEVICE,
    REBOOT_DEVICE,
    SELF_TEST_DEVICE,
    DELETE_DEVICE,
    GET_DEVICE_DETAILS,
    UPDATE_FLOWS_BULK,
    UPDATE_FLOWS_INCREMENTALLY,
    UPDATE_PM_CONFIG,
    RECEIVE_PACKET_OUT,
    SUPPRESS_ALARM,
    UNSUPPRESS_ALARM,
    DOWNLOAD_IMAGE,
    GET_IMAGE_DOWNLOAD_STATUS,
    CANCEL_IMAGE_DOWNLOAD,
    ACTIVATE_IMAGE_UPDATE,
    REVERT_IMAGE_UPDATE,
];

pub struct DeviceArg {
    pub device: Device,
}

impl FromArgs for DeviceArg {
    const KEYS: &'static [&'static str] = &[KEY_DEVICE];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        Ok(Self {
            device: Args::new(args).only()?,
        })
    }
}

pub struct PortInfoArgs {
    pub device: Device,
    pub port_no: IntType,
}

impl FromArgs for PortInfoArgs {
    const KEYS: &'static [&'static str] = &[KEY_DEVICE, KEY_PORT_NO];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        let args = Args::new(args);
        args.expect_count(2)?;
        Ok(Self {
            device: args.get(KEY_DEVICE)?,
            port_no: args.get(KEY_PORT_NO)?,
        })
    }
}

pub struct InterAdapterArg {
    pub message: InterAdapterMessage,
}

impl FromArgs for InterAdapterArg {
    const KEYS: &'static [&'static str] = &[KEY_MESSAGE];

    fn from_args(args: &[Argument]) -> Result<Self, HandlerError> {
        Ok(Self {
            message: Args::new(args).only()?,
        })
    }
}

/// Build the table that serves `adapter` on the bus.
pub fn adapter_capabilities(adapter: Arc<dyn Adapter>) -> CapabilityTable {
    let adopt = adapter.clone();
    let device_info = adapter.clone();
    let port_info = adapter.clone();
    let inter_adapter = adapter;

    let builder = CapabilityTable::builder()
        .handle(ADOPT_DEVICE, move |p: DeviceArg| adopt_device(adopt.clone(), p))
        .handle(GET_OFP_DEVICE_INFO, move |p: DeviceArg| {
            get_ofp_device_info(device_info.clone(), p)
        })
        .handle(GET_OFP_PORT_INFO, move |p: PortInfoArgs| {
            get_ofp_port_info(port_info.clone(), p)
        })
        .handle(PROCESS_INTER_ADAPTER_MESSAGE, move |p: InterAdapterArg| {
            process_inter_adapter_message(inter_adapter.clone(), p)
        });

    STUBS.iter().fold(builder, |b, name| b.stub(name)).build()
}

async fn adopt_device(adapter: Arc<dyn Adapter>, p: DeviceArg) -> HandlerResult {
    tracing::debug!("[AdapterHandler] adopt_device {}", p.device.id);
    adapter.adopt_device(&p.device).await?;
    Ok(None)
}

async fn get_ofp_device_info(adapter: Arc<dyn Adapter>, p: DeviceArg) -> HandlerResult {
    tracing::debug!("[AdapterHandler] get_ofp_device_info {}", p.device.id);
    let capability = adapter.get_ofp_device_info(&p.device).await?;
    Ok(Some(Any::pack(&capability)?))
}

async fn get_ofp_port_info(adapter: Arc<dyn Adapter>, p: PortInfoArgs) -> HandlerResult {
    tracing::debug!(
        "[AdapterHandler] get_ofp_port_info {} port {}",
        p.device.id,
        p.port_no.val
    );
    let capability = adapter.get_ofp_port_info(&p.device, p.port_no.val).await?;
    Ok(Some(Any::pack(&capability)?))
}

async fn process_inter_adapter_message(adapter: Arc<dyn Adapter>, p: InterAdapterArg) -> HandlerResult {
    tracing::debug!("[AdapterHandler] process_inter_adapter_message {}", p.message.header.id);
    adapter.process_inter_adapter_message(&p.message).await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use crate::error::AdapterError;
    use crate::models::{PortCapability, SwitchCapability};
    use crate::rpc::envelope::{CorrelationId, ErrorCode, RequestEnvelope};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        adopted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Adapter for Recorder {
        async fn adopt_device(&self, device: &Device) -> Result<(), AdapterError> {
            if device.id == "refuse" {
                return Err(AdapterError::new("device refuse is unknown"));
            }
            self.adopted.lock().unwrap().push(device.id.clone());
            Ok(())
        }

        async fn get_ofp_device_info(&self, _device: &Device) -> Result<SwitchCapability, AdapterError> {
            Ok(SwitchCapability::default())
        }

        async fn get_ofp_port_info(&self, _device: &Device, port_no: i64) -> Result<PortCapability, AdapterError> {
            let mut capability = PortCapability::default();
            capability.port.port_no = port_no as u32;
            Ok(capability)
        }

        async fn process_inter_adapter_message(&self, _message: &InterAdapterMessage) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    fn request(rpc: &str, args: Vec<Argument>) -> RequestEnvelope {
        RequestEnvelope {
            rpc: rpc.to_string(),
            args,
            reply_to_topic: Some(Topic::new("rwcore_123456789012345678901234")),
            from_topic: Topic::new("rwcore"),
            correlation_id: CorrelationId::generate(),
            response_required: true,
        }
    }

    fn device(id: &str) -> Argument {
        Argument::new(KEY_DEVICE, &Device::new(id, "simulated_olt")).unwrap()
    }

    #[tokio::test]
    async fn test_adopt_device_arity() {
        let recorder = Arc::new(Recorder::default());
        let table = adapter_capabilities(recorder.clone());

        let none = table.dispatch(&request(ADOPT_DEVICE, vec![])).await;
        assert_eq!(none.error().unwrap().code, ErrorCode::InvalidArgument);

        let two = table
            .dispatch(&request(ADOPT_DEVICE, vec![device("a"), device("b")]))
            .await;
        assert_eq!(two.error().unwrap().code, ErrorCode::InvalidArgument);
        assert!(recorder.adopted.lock().unwrap().is_empty());

        let one = table.dispatch(&request(ADOPT_DEVICE, vec![device("a")])).await;
        assert!(one.success);
        assert!(one.result.is_none());
        assert_eq!(*recorder.adopted.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_adapter_error_becomes_not_found() {
        let table = adapter_capabilities(Arc::new(Recorder::default()));
        let response = table.dispatch(&request(ADOPT_DEVICE, vec![device("refuse")])).await;
        let error = response.error().unwrap();
        assert_eq!(error.code, ErrorCode::NotFound);
        assert_eq!(error.reason, "device refuse is unknown");
    }

    #[tokio::test]
    async fn test_port_info_needs_both_keys() {
        let table = adapter_capabilities(Arc::new(Recorder::default()));
        let port_no = Argument::new(KEY_PORT_NO, &IntType { val: 3 }).unwrap();

        let response = table
            .dispatch(&request(GET_OFP_PORT_INFO, vec![device("a"), port_no.clone()]))
            .await;
        let capability: PortCapability = response.result.unwrap().unpack().unwrap();
        assert_eq!(capability.port.port_no, 3);

        let missing = table.dispatch(&request(GET_OFP_PORT_INFO, vec![device("a")])).await;
        assert_eq!(missing.error().unwrap().code, ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_every_stub_acknowledges() {
        let table = adapter_capabilities(Arc::new(Recorder::default()));
        assert_eq!(table.len(), STUBS.len() + 4);
        for name in STUBS {
            assert!(table.is_stub(name));
            let response = table.dispatch(&request(name, vec![device("a")])).await;
            assert!(response.success, "{} should acknowledge", name);
            assert!(response.result.is_none());
        }
    }
}
