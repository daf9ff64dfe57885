use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rpc::envelope::TypedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSeverity {
    Indeterminate,
    Warning,
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Raised,
    Cleared,
}

/// Unsolicited alarm pushed by an adapter over a device reply topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub device_id: String,
    pub category: String,
    pub severity: AlarmSeverity,
    pub state: AlarmState,
    #[serde(default)]
    pub description: String,
    pub raised_at: DateTime<Utc>,
}

impl TypedMessage for Alarm {
    const TYPE_NAME: &'static str = "intercore.Alarm";
}
