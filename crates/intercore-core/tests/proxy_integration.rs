//! End-to-end tests: a core and an adapter talking through the typed proxies
//! over one in-process bus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use intercore_core::adapter::{adapter_capabilities, Adapter, CoreProxy};
use intercore_core::bus::{device_id_from_topic, MemoryBus, Topic};
use intercore_core::error::{AdapterError, HandlerError, RpcError};
use intercore_core::models::*;
use intercore_core::orchestrator::{core_capabilities, AdapterProxy, DeviceEventObserver};
use intercore_core::rpc::{Any, CallContext, EngineConfig, RpcEngine, WeakRpcEngine};

const ADAPTER_TYPE: &str = "simulated_olt";
const DEVICE_ID: &str = "0123456789abcdef01234567";

/// Adapter that records what it was asked to do and opens the
/// device-scoped topic on adoption.
struct RecordingAdapter {
    engine: WeakRpcEngine,
    adopted: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Adapter for RecordingAdapter {
    async fn adopt_device(&self, device: &Device) -> Result<(), AdapterError> {
        if device.id.starts_with("refused") {
            return Err(AdapterError::new(format!("device {} not reachable", device.id)));
        }
        let engine = self
            .engine
            .upgrade()
            .ok_or_else(|| AdapterError::new("adapter engine gone"))?;
        engine
            .subscribe_with_default_request_handler(&AdapterProxy::device_topic(device))
            .await
            .map_err(|e| AdapterError::new(e.to_string()))?;
        self.adopted.lock().unwrap().push(device.id.clone());
        Ok(())
    }

    async fn get_ofp_device_info(&self, device: &Device) -> Result<SwitchCapability, AdapterError> {
        let mut capability = SwitchCapability::default();
        capability.desc.serial_num = device.id.clone();
        capability.switch_features.n_tables = 2;
        Ok(capability)
    }

    async fn get_ofp_port_info(&self, _device: &Device, port_no: i64) -> Result<PortCapability, AdapterError> {
        let mut capability = PortCapability::default();
        capability.port.port_no = port_no as u32;
        capability.port.name = format!("port-{}", port_no);
        Ok(capability)
    }

    async fn process_inter_adapter_message(&self, message: &InterAdapterMessage) -> Result<(), AdapterError> {
        self.messages.lock().unwrap().push(message.header.id.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Registered(String),
    StateChanged(String, OperStatus, ConnectStatus),
    PortCreated(String, u32),
    PacketIn(String, u32),
    Alarm(String),
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) -> Result<(), HandlerError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl DeviceEventObserver for RecordingObserver {
    async fn adapter_registered(&self, adapter: AdapterDescriptor) -> Result<(), HandlerError> {
        self.record(Event::Registered(adapter.id))
    }

    async fn device_state_changed(
        &self,
        device_id: String,
        oper_status: OperStatus,
        connect_status: ConnectStatus,
    ) -> Result<(), HandlerError> {
        self.record(Event::StateChanged(device_id, oper_status, connect_status))
    }

    async fn port_created(&self, device_id: String, port: Port) -> Result<(), HandlerError> {
        self.record(Event::PortCreated(device_id, port.port_no))
    }

    async fn packet_in(&self, device_id: String, port_no: u32, _packet: PacketIn) -> Result<(), HandlerError> {
        self.record(Event::PacketIn(device_id, port_no))
    }

    async fn alarm(&self, alarm: Alarm) -> Result<(), HandlerError> {
        self.record(Event::Alarm(alarm.id))
    }
}

struct TestFixture {
    bus: MemoryBus,
    core: RpcEngine,
    adapter_engine: RpcEngine,
    proxy: AdapterProxy,
    core_proxy: CoreProxy,
    adapter: Arc<RecordingAdapter>,
    observer: Arc<RecordingObserver>,
}

async fn fixture() -> TestFixture {
    let bus = MemoryBus::new();
    let config = |topic: &str| EngineConfig {
        default_topic: Topic::new(topic),
        request_timeout: Duration::from_secs(5),
    };

    let core = RpcEngine::new(Arc::new(bus.clone()), config("rwcore"));
    let observer = Arc::new(RecordingObserver::default());
    core.bind_capabilities(core_capabilities(observer.clone())).unwrap();
    core.start().await.unwrap();

    let adapter_engine = RpcEngine::new(Arc::new(bus.clone()), config(ADAPTER_TYPE));
    let adapter = Arc::new(RecordingAdapter {
        engine: adapter_engine.downgrade(),
        adopted: Mutex::new(Vec::new()),
        messages: Mutex::new(Vec::new()),
    });
    adapter_engine
        .bind_capabilities(adapter_capabilities(adapter.clone()))
        .unwrap();
    adapter_engine.start().await.unwrap();

    TestFixture {
        proxy: AdapterProxy::new(core.clone()),
        core_proxy: CoreProxy::new(adapter_engine.clone(), Topic::new("rwcore")),
        bus,
        core,
        adapter_engine,
        adapter,
        observer,
    }
}

fn device() -> Device {
    Device::new(DEVICE_ID, ADAPTER_TYPE)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_adopt_device_opens_both_device_topics() {
    let f = fixture().await;
    f.proxy.adopt_device(&CallContext::new(), &device()).await.unwrap();

    let reply_topic = f.proxy.reply_topic(DEVICE_ID);
    assert_eq!(reply_topic.name(), "rwcore_0123456789abcdef01234567");
    assert_eq!(device_id_from_topic(&reply_topic), DEVICE_ID);
    assert!(f.core.is_subscribed(&reply_topic).await);
    assert!(
        f.adapter_engine
            .is_subscribed(&AdapterProxy::device_topic(&device()))
            .await
    );
    assert_eq!(*f.adapter.adopted.lock().unwrap(), vec![DEVICE_ID.to_string()]);
    assert_eq!(f.core.pending_calls(), 0);
}

#[tokio::test]
async fn test_adapter_refusal_surfaces_as_not_found() {
    let f = fixture().await;
    let refused = Device::new("refused-0123456789abcdef", ADAPTER_TYPE);
    let err = f.proxy.adopt_device(&CallContext::new(), &refused).await.unwrap_err();
    match err {
        RpcError::NotFound(reason) => assert!(reason.contains("not reachable")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openflow_info_over_device_topic() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();

    let switch = f.proxy.get_ofp_device_info(&ctx, &device()).await.unwrap();
    assert_eq!(switch.desc.serial_num, DEVICE_ID);
    assert_eq!(switch.switch_features.n_tables, 2);

    let port = f.proxy.get_ofp_port_info(&ctx, &device(), 16).await.unwrap();
    assert_eq!(port.port.port_no, 16);
    assert_eq!(port.port.name, "port-16");
}

#[tokio::test]
async fn test_device_scoped_call_before_adoption_times_out() {
    let f = fixture().await;
    let err = f
        .proxy
        .get_ofp_device_info(&CallContext::with_timeout(Duration::from_millis(100)), &device())
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::DeadlineExceeded(_)));
    assert_eq!(f.core.pending_calls(), 0);
}

#[tokio::test]
async fn test_stubbed_lifecycle_calls_acknowledge() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();

    f.proxy.disable_device(&ctx, &device()).await.unwrap();
    f.proxy.reenable_device(&ctx, &device()).await.unwrap();
    f.proxy.reboot_device(&ctx, &device()).await.unwrap();
    f.proxy
        .update_flows_bulk(&ctx, &device(), &Flows::default(), &FlowGroups::default())
        .await
        .unwrap();
    f.proxy
        .update_flows_incremental(&ctx, &device(), &FlowChanges::default(), &FlowGroupChanges::default())
        .await
        .unwrap();
    f.proxy.self_test_device(&ctx, &device()).await.unwrap();
}

#[tokio::test]
async fn test_packet_out_does_not_wait() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();

    let packet = PacketOut {
        in_port: 1,
        actions: vec!["output:2".into()],
        data: vec![0xde, 0xad],
    };
    f.proxy
        .packet_out(&ctx, ADAPTER_TYPE, DEVICE_ID, 2, &packet)
        .await
        .unwrap();
    assert_eq!(f.core.pending_calls(), 0);
}

#[tokio::test]
async fn test_unsolicited_messages_arrive_on_reply_topic() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();

    f.core_proxy
        .send_packet_in(&ctx, DEVICE_ID, 3, &PacketIn { port_no: 3, data: vec![1] })
        .await
        .unwrap();
    f.core_proxy
        .send_alarm(
            &ctx,
            &Alarm {
                id: "alarm-1".into(),
                device_id: DEVICE_ID.into(),
                category: "PON".into(),
                severity: AlarmSeverity::Major,
                state: AlarmState::Raised,
                description: "los".into(),
                raised_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    settle().await;

    let events = f.observer.events();
    assert!(events.contains(&Event::PacketIn(DEVICE_ID.into(), 3)));
    assert!(events.contains(&Event::Alarm("alarm-1".into())));
}

#[tokio::test]
async fn test_adapter_reports_to_core() {
    let f = fixture().await;
    let ctx = CallContext::new();

    f.core_proxy
        .register_adapter(
            &ctx,
            &AdapterDescriptor {
                id: ADAPTER_TYPE.into(),
                vendor: "intercore".into(),
                version: "0.1.0".into(),
                device_types: vec![ADAPTER_TYPE.into()],
            },
        )
        .await
        .unwrap();
    f.core_proxy
        .device_state_update(&ctx, DEVICE_ID, OperStatus::Active, ConnectStatus::Reachable)
        .await
        .unwrap();
    f.core_proxy
        .port_created(
            &ctx,
            DEVICE_ID,
            &Port {
                port_no: 7,
                label: "nni-7".into(),
                port_type: PortType::EthernetNni,
                device_id: DEVICE_ID.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        f.observer.events(),
        vec![
            Event::Registered(ADAPTER_TYPE.into()),
            Event::StateChanged(DEVICE_ID.into(), OperStatus::Active, ConnectStatus::Reachable),
            Event::PortCreated(DEVICE_ID.into(), 7),
        ]
    );
}

#[tokio::test]
async fn test_inter_adapter_message_reaches_target_device() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();

    let message = InterAdapterMessage {
        header: InterAdapterHeader {
            id: "msg-1".into(),
            message_type: InterAdapterMessageType::OmciRequest,
            from_topic: "simulated_onu".into(),
            to_topic: ADAPTER_TYPE.into(),
            to_device_id: DEVICE_ID.into(),
            proxy_device_id: None,
            timestamp: Utc::now(),
        },
        body: Any::pack(&StrType { val: "omci".into() }).unwrap(),
    };
    f.proxy.process_inter_adapter_message(&ctx, &message).await.unwrap();
    assert_eq!(*f.adapter.messages.lock().unwrap(), vec!["msg-1".to_string()]);
}

#[tokio::test]
async fn test_delete_device_tears_down_reply_topic() {
    let f = fixture().await;
    let ctx = CallContext::new();
    f.proxy.adopt_device(&ctx, &device()).await.unwrap();
    let reply_topic = f.proxy.reply_topic(DEVICE_ID);

    f.proxy.delete_device(&ctx, &device()).await.unwrap();

    assert!(!f.core.is_subscribed(&reply_topic).await);
    assert!(f.bus.deleted_topics().await.contains(&reply_topic));

    // Nothing consumes the topic any more, so a late alarm is never served.
    f.core_proxy
        .send_alarm(
            &ctx,
            &Alarm {
                id: "late".into(),
                device_id: DEVICE_ID.into(),
                category: "PON".into(),
                severity: AlarmSeverity::Minor,
                state: AlarmState::Cleared,
                description: String::new(),
                raised_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    settle().await;
    assert!(f.observer.events().is_empty());
}

#[tokio::test]
async fn test_core_shutdown_fails_waiting_calls() {
    let f = fixture().await;
    let proxy = f.proxy.clone();
    // Addressed to a topic nobody consumes, so the call parks until shutdown.
    let call = tokio::spawn(async move {
        proxy
            .get_ofp_device_info(&CallContext::new(), &Device::new(DEVICE_ID, "absent_type"))
            .await
    });
    settle().await;
    f.core.shutdown().await;

    assert!(matches!(call.await.unwrap(), Err(RpcError::Unavailable(_))));
}
