//! OpenFlow-facing payloads exchanged between the core and adapters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rpc::envelope::TypedMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDescription {
    pub mfr_desc: String,
    pub hw_desc: String,
    pub sw_desc: String,
    pub serial_num: String,
    pub dp_desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchFeatures {
    pub n_buffers: u32,
    pub n_tables: u32,
    pub capabilities: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCapability {
    pub desc: SwitchDescription,
    pub switch_features: SwitchFeatures,
}

impl TypedMessage for SwitchCapability {
    const TYPE_NAME: &'static str = "intercore.SwitchCapability";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfpPort {
    pub port_no: u32,
    pub hw_addr: String,
    pub name: String,
    pub config: u32,
    pub state: u32,
    pub curr_speed: u32,
    pub max_speed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortCapability {
    pub port: OfpPort,
}

impl TypedMessage for PortCapability {
    const TYPE_NAME: &'static str = "intercore.PortCapability";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub id: u64,
    pub table_id: u32,
    pub priority: u32,
    pub cookie: u64,
    #[serde(default)]
    pub match_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flows {
    #[serde(default)]
    pub items: Vec<FlowStats>,
}

impl TypedMessage for Flows {
    const TYPE_NAME: &'static str = "intercore.Flows";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGroup {
    pub group_id: u32,
    pub group_type: String,
    #[serde(default)]
    pub buckets: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGroups {
    #[serde(default)]
    pub items: Vec<FlowGroup>,
}

impl TypedMessage for FlowGroups {
    const TYPE_NAME: &'static str = "intercore.FlowGroups";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowChanges {
    #[serde(default)]
    pub to_add: Flows,
    #[serde(default)]
    pub to_remove: Flows,
}

impl TypedMessage for FlowChanges {
    const TYPE_NAME: &'static str = "intercore.FlowChanges";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGroupChanges {
    #[serde(default)]
    pub to_add: FlowGroups,
    #[serde(default)]
    pub to_remove: FlowGroups,
    #[serde(default)]
    pub to_update: FlowGroups,
}

impl TypedMessage for FlowGroupChanges {
    const TYPE_NAME: &'static str = "intercore.FlowGroupChanges";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketOut {
    pub in_port: u32,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl TypedMessage for PacketOut {
    const TYPE_NAME: &'static str = "intercore.PacketOut";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketIn {
    pub port_no: u32,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl TypedMessage for PacketIn {
    const TYPE_NAME: &'static str = "intercore.PacketIn";
}
