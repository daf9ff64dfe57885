//! Capability names as they appear in `RequestEnvelope::rpc`.

// Served by adapters.
pub const ADAPTER_DESCRIPTOR: &str = "adapter_descriptor";
pub const DEVICE_TYPES: &str = "device_types";
pub const HEALTH: &str = "health";
pub const ADOPT_DEVICE: &str = "adopt_device";
pub const RECONCILE_DEVICE: &str = "reconcile_device";
pub const ABANDON_DEVICE: &str = "abandon_device";
pub const DISABLE_DEVICE: &str = "disable_device";
pub const REENABLE_DEVICE: &str = "reenable_device";
pub const REBOOT_DEVICE: &str = "reboot_device";
pub const SELF_TEST_DEVICE: &str = "self_test_device";
pub const DELETE_DEVICE: &str = "delete_device";
pub const GET_DEVICE_DETAILS: &str = "get_device_details";
pub const GET_OFP_DEVICE_INFO: &str = "get_ofp_device_info";
pub const GET_OFP_PORT_INFO: &str = "get_ofp_port_info";
pub const PROCESS_INTER_ADAPTER_MESSAGE: &str = "process_inter_adapter_message";
pub const UPDATE_FLOWS_BULK: &str = "update_flows_bulk";
pub const UPDATE_FLOWS_INCREMENTALLY: &str = "update_flows_incrementally";
pub const UPDATE_PM_CONFIG: &str = "update_pm_config";
pub const RECEIVE_PACKET_OUT: &str = "receive_packet_out";
pub const SUPPRESS_ALARM: &str = "suppress_alarm";
pub const UNSUPPRESS_ALARM: &str = "unsuppress_alarm";
pub const DOWNLOAD_IMAGE: &str = "download_image";
pub const GET_IMAGE_DOWNLOAD_STATUS: &str = "get_image_download_status";
pub const CANCEL_IMAGE_DOWNLOAD: &str = "cancel_image_download";
pub const ACTIVATE_IMAGE_UPDATE: &str = "activate_image_update";
pub const REVERT_IMAGE_UPDATE: &str = "revert_image_update";

// Served by the core.
pub const REGISTER: &str = "register";
pub const DEVICE_STATE_UPDATE: &str = "device_state_update";
pub const PORT_CREATED: &str = "port_created";
pub const PACKET_IN: &str = "packet_in";
pub const DEVICE_ALARM: &str = "device_alarm";

// Argument keys.
pub const KEY_DEVICE: &str = "device";
pub const KEY_DEVICE_ID: &str = "device_id";
pub const KEY_PORT_NO: &str = "port_no";
pub const KEY_PORT: &str = "port";
pub const KEY_PACKET: &str = "packet";
pub const KEY_OUT_PORT: &str = "outPort";
pub const KEY_DEVICE_ID_CAMEL: &str = "deviceId";
pub const KEY_FLOWS: &str = "flows";
pub const KEY_GROUPS: &str = "groups";
pub const KEY_FLOW_CHANGES: &str = "flow_changes";
pub const KEY_GROUP_CHANGES: &str = "group_changes";
pub const KEY_MESSAGE: &str = "msg";
pub const KEY_ADAPTER: &str = "adapter";
pub const KEY_OPER_STATUS: &str = "oper_status";
pub const KEY_CONNECT_STATUS: &str = "connect_status";
pub const KEY_ALARM: &str = "alarm";
