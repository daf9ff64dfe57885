use serde::{Deserialize, Serialize};

use crate::rpc::envelope::TypedMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminState {
    #[default]
    Unknown,
    Preprovisioned,
    Enabled,
    Disabled,
    Downloading,
    Deleted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperStatus {
    #[default]
    Unknown,
    Discovered,
    Activating,
    Testing,
    Active,
    Failed,
}

impl TypedMessage for OperStatus {
    const TYPE_NAME: &'static str = "intercore.OperStatus";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectStatus {
    #[default]
    Unknown,
    Unreachable,
    Reachable,
}

impl TypedMessage for ConnectStatus {
    const TYPE_NAME: &'static str = "intercore.ConnectStatus";
}

/// A managed device. `device_type` names the adapter family that owns it and
/// doubles as that adapter's inbound topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    /// `host:port` the adapter reaches the device on.
    #[serde(default)]
    pub host_and_port: Option<String>,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default)]
    pub oper_status: OperStatus,
    #[serde(default)]
    pub connect_status: ConnectStatus,
}

impl Device {
    pub fn new(id: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device_type: device_type.into(),
            admin_state: AdminState::Preprovisioned,
            ..Default::default()
        }
    }
}

impl TypedMessage for Device {
    const TYPE_NAME: &'static str = "intercore.Device";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    #[default]
    Unknown,
    EthernetNni,
    EthernetUni,
    PonOlt,
    PonOnu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub port_no: u32,
    pub label: String,
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub device_id: String,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default)]
    pub oper_status: OperStatus,
}

impl TypedMessage for Port {
    const TYPE_NAME: &'static str = "intercore.Port";
}

/// What an adapter announces about itself when registering with the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDescriptor {
    pub id: String,
    pub vendor: String,
    pub version: String,
    /// Device types served by this adapter.
    #[serde(default)]
    pub device_types: Vec<String>,
}

impl TypedMessage for AdapterDescriptor {
    const TYPE_NAME: &'static str = "intercore.AdapterDescriptor";
}
