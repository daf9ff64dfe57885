//! Front-door tests: a real TCP listener in front of a core engine, with a
//! simulated adapter on the same in-process bus.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::get;
use serde_json::{json, Value};

use intercore_core::adapter::{adapter_capabilities, Adapter};
use intercore_core::bus::{MemoryBus, Topic};
use intercore_core::error::AdapterError;
use intercore_core::models::*;
use intercore_core::orchestrator::AdapterProxy;
use intercore_core::rpc::{EngineConfig, RpcEngine, WeakRpcEngine};
use intercore_server::rpc::types::{INVALID_PARAMS, METHOD_NOT_FOUND, NOT_FOUND};
use intercore_server::rpc::RpcRouter;
use intercore_server::{ApiServer, AppState, AppStateInner, ServerConfig, ServerError, TlsConfig};

const ADAPTER_TYPE: &str = "simulated_olt";
const DEVICE_ID: &str = "fedcba9876543210fedcba98";

struct TestAdapter {
    engine: WeakRpcEngine,
    adopted: Mutex<Vec<String>>,
}

#[async_trait]
impl Adapter for TestAdapter {
    async fn adopt_device(&self, device: &Device) -> Result<(), AdapterError> {
        if device.id.starts_with("refused") {
            return Err(AdapterError::new("device not reachable"));
        }
        let engine = self.engine.upgrade().ok_or_else(|| AdapterError::new("engine gone"))?;
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
        Ok(capability)
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

struct TestFixture {
    state: AppState,
    adapter: Arc<TestAdapter>,
    // Kept alive for the adapter's weak handle.
    _adapter_engine: RpcEngine,
}

async fn fixture() -> TestFixture {
    let bus = MemoryBus::new();
    let config = |topic: &str| EngineConfig {
        default_topic: Topic::new(topic),
        request_timeout: Duration::from_secs(2),
    };

    let core = RpcEngine::new(Arc::new(bus.clone()), config("rwcore"));
    core.start().await.unwrap();

    let adapter_engine = RpcEngine::new(Arc::new(bus.clone()), config(ADAPTER_TYPE));
    let adapter = Arc::new(TestAdapter {
        engine: adapter_engine.downgrade(),
        adopted: Mutex::new(Vec::new()),
    });
    adapter_engine
        .bind_capabilities(adapter_capabilities(adapter.clone()))
        .unwrap();
    adapter_engine.start().await.unwrap();

    TestFixture {
        state: Arc::new(AppStateInner::new(core)),
        adapter,
        _adapter_engine: adapter_engine,
    }
}

async fn started(server: &mut ApiServer) -> SocketAddr {
    server.start().await.expect("server should start")
}

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        ..ServerConfig::default()
    }
}

fn device_json(id: &str) -> Value {
    json!({ "id": id, "type": ADAPTER_TYPE })
}

async fn post_rpc(addr: SocketAddr, body: Value) -> Value {
    reqwest::Client::new()
        .post(format!("http://{}/api/rpc", addr))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_engine_state() {
    let f = fixture().await;
    let mut server = ApiServer::new(test_config(), f.state.clone());
    let addr = started(&mut server).await;

    let health: Value = reqwest::get(format!("http://{}/api/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["defaultTopic"], "rwcore");
    assert_eq!(health["subscribedTopics"], json!(["rwcore"]));
    assert_eq!(health["pendingCalls"], 0);

    server.stop().await;
}

#[tokio::test]
async fn test_adopt_over_http_reaches_adapter() {
    let f = fixture().await;
    let mut server = ApiServer::new(test_config(), f.state.clone());
    let addr = started(&mut server).await;

    let response = post_rpc(
        addr,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "devices.adopt",
            "params": { "device": device_json(DEVICE_ID) }
        }),
    )
    .await;

    assert_eq!(response["result"]["deviceId"], DEVICE_ID);
    assert_eq!(response["result"]["ok"], true);
    assert_eq!(*f.adapter.adopted.lock().unwrap(), vec![DEVICE_ID.to_string()]);

    let reply_topic = Topic::new(format!("rwcore_{}", DEVICE_ID));
    assert!(f.state.engine.is_subscribed(&reply_topic).await);

    server.stop().await;
}

#[tokio::test]
async fn test_adapter_refusal_maps_to_not_found() {
    let f = fixture().await;
    let router = RpcRouter::new(f.state.clone());

    let response = router
        .handle_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "devices.adopt",
            "params": { "device": device_json("refused-000000000000000") }
        }))
        .await;

    let error = response.get("error").expect("Expected error");
    assert_eq!(error["code"], NOT_FOUND);
    assert_eq!(error["data"]["class"], "NOT_FOUND");
    assert!(error["message"].as_str().unwrap().contains("device not reachable"));
}

#[tokio::test]
async fn test_device_scoped_calls_after_adoption() {
    let f = fixture().await;
    let router = RpcRouter::new(f.state.clone());

    let batch = router
        .handle_value(json!([
            {
                "jsonrpc": "2.0",
                "id": 1,
                "method": "devices.adopt",
                "params": { "device": device_json(DEVICE_ID) }
            },
            {
                "jsonrpc": "2.0",
                "id": 2,
                "method": "devices.ofpInfo",
                "params": { "device": device_json(DEVICE_ID) }
            },
            {
                "jsonrpc": "2.0",
                "id": 3,
                "method": "devices.portInfo",
                "params": { "device": device_json(DEVICE_ID), "portNo": 16 }
            }
        ]))
        .await;

    let responses = batch.as_array().expect("Expected batch array");
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["result"]["ok"], true);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["desc"]["serialNum"], DEVICE_ID);
    assert_eq!(responses[2]["result"]["port"]["portNo"], 16);
}

#[tokio::test]
async fn test_call_before_adoption_times_out() {
    let f = fixture().await;
    let router = RpcRouter::new(f.state.clone());

    let response = router
        .handle_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "devices.reboot",
            "params": { "device": device_json(DEVICE_ID), "timeoutMs": 50 }
        }))
        .await;

    assert_eq!(response["error"]["data"]["class"], "DEADLINE_EXCEEDED");
    assert_eq!(f.state.engine.pending_calls(), 0);
}

#[tokio::test]
async fn test_packet_out_does_not_wait() {
    let f = fixture().await;
    let router = RpcRouter::new(f.state.clone());

    let response = router
        .handle_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "devices.packetOut",
            "params": {
                "deviceType": ADAPTER_TYPE,
                "deviceId": DEVICE_ID,
                "outPort": 2,
                "packet": { "inPort": 1, "data": [1, 2, 3] }
            }
        }))
        .await;

    assert_eq!(response["result"]["ok"], true);
    assert_eq!(f.state.engine.pending_calls(), 0);
}

#[tokio::test]
async fn test_protocol_errors() {
    let f = fixture().await;
    let router = RpcRouter::new(f.state.clone());

    let unknown = router
        .handle_value(json!({ "jsonrpc": "2.0", "id": 1, "method": "devices.explode" }))
        .await;
    assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

    let missing_device = router
        .handle_value(json!({ "jsonrpc": "2.0", "id": 2, "method": "devices.adopt", "params": {} }))
        .await;
    assert_eq!(missing_device["error"]["code"], INVALID_PARAMS);

    let empty_id = router
        .handle_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "devices.disable",
            "params": { "device": { "id": "", "type": ADAPTER_TYPE } }
        }))
        .await;
    assert_eq!(empty_id["error"]["code"], INVALID_PARAMS);

    let raw = router.handle_request("{not json").await;
    assert!(raw.contains("-32700"));
}

#[tokio::test]
async fn test_method_list_and_extra_service() {
    let f = fixture().await;
    let mut server = ApiServer::new(test_config(), f.state.clone());
    server.add_service(|router| router.route("/api/version", get(|| async { "v-test" })));
    let addr = started(&mut server).await;

    let methods: Value = reqwest::get(format!("http://{}/api/rpc/methods", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let methods = methods["methods"].as_array().unwrap();
    assert_eq!(methods.len(), 10);
    assert!(methods.contains(&json!("devices.updateFlowsIncremental")));

    let version = reqwest::get(format!("http://{}/api/version", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(version, "v-test");

    server.stop().await;
}

#[tokio::test]
async fn test_stop_releases_listener() {
    let f = fixture().await;
    let mut server = ApiServer::new(test_config(), f.state.clone());
    let addr = started(&mut server).await;
    assert!(server.is_running());

    server.stop().await;
    assert!(!server.is_running());
    assert!(reqwest::get(format!("http://{}/api/health", addr)).await.is_err());
    assert!(matches!(server.start().await, Err(ServerError::Stopped)));
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let f = fixture().await;
    let mut server = ApiServer::new(test_config(), f.state.clone());
    started(&mut server).await;
    assert!(matches!(server.start().await, Err(ServerError::AlreadyStarted)));
    server.stop().await;
}

#[tokio::test]
async fn test_tls_with_missing_files_fails_before_binding() {
    let f = fixture().await;
    let config = ServerConfig {
        port: 0,
        tls: Some(TlsConfig {
            cert_file: "/nonexistent/cert.pem".into(),
            key_file: "/nonexistent/key.pem".into(),
        }),
        ..ServerConfig::default()
    };
    let mut server = ApiServer::new(config, f.state.clone());

    assert!(matches!(server.start().await, Err(ServerError::Tls(_))));
    assert!(!server.is_running());
}

#[tokio::test]
async fn test_tls_with_empty_pem_is_rejected() {
    let f = fixture().await;
    let mut cert = tempfile::NamedTempFile::new().unwrap();
    writeln!(cert, "not a certificate").unwrap();
    let key = tempfile::NamedTempFile::new().unwrap();

    let config = ServerConfig {
        port: 0,
        tls: Some(TlsConfig {
            cert_file: cert.path().to_path_buf(),
            key_file: key.path().to_path_buf(),
        }),
        ..ServerConfig::default()
    };
    let mut server = ApiServer::new(config, f.state.clone());

    match server.start().await {
        Err(ServerError::Tls(reason)) => assert!(reason.contains("no certificates")),
        other => panic!("expected TLS error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_tls_serves_health_and_stops() {
    let f = fixture().await;
    let generated = rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string()]).unwrap();
    let cert_pem = generated.cert.pem();

    let mut cert = tempfile::NamedTempFile::new().unwrap();
    cert.write_all(cert_pem.as_bytes()).unwrap();
    let mut key = tempfile::NamedTempFile::new().unwrap();
    key.write_all(generated.key_pair.serialize_pem().as_bytes()).unwrap();

    let config = ServerConfig {
        port: 0,
        tls: Some(TlsConfig {
            cert_file: cert.path().to_path_buf(),
            key_file: key.path().to_path_buf(),
        }),
        ..ServerConfig::default()
    };
    let mut server = ApiServer::new(config, f.state.clone());
    let addr = started(&mut server).await;

    let client = reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_pem(cert_pem.as_bytes()).unwrap())
        .build()
        .unwrap();
    let health: Value = client
        .get(format!("https://{}/api/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let response = client
        .post(format!("https://{}/api/rpc", addr))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "devices.adopt",
            "params": { "device": device_json(DEVICE_ID) }
        }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["deviceId"], DEVICE_ID);

    // Plain HTTP is not spoken on the TLS listener.
    assert!(reqwest::get(format!("http://{}/api/health", addr)).await.is_err());

    server.stop().await;
    assert!(!server.is_running());
    let fresh = reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_pem(cert_pem.as_bytes()).unwrap())
        .build()
        .unwrap();
    assert!(fresh.get(format!("https://{}/api/health", addr)).send().await.is_err());
}
