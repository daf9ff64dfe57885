//! Topic names and the naming conventions built on top of them.
//!
//! Device-scoped topics follow `<prefix>_<deviceId>` where the device id is a
//! fixed-length token. `device_id_from_topic` is a best-effort parser of that
//! convention: a 24-character final segment that is not really a device id is
//! indistinguishable from one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BusError;

pub const TOPIC_SEPARATOR: &str = "_";
pub const DEVICE_ID_LENGTH: usize = 24;

const TOPIC_PUNCTUATION: &str = "-_.~+%";

/// A named channel on the message bus.
///
/// Construction does not validate the name; the bus rejects illegal names
/// when the topic is actually used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic {
    name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Check the name against `[A-Za-z][A-Za-z0-9\-_.~+%]*`.
    pub fn validate(&self) -> Result<(), BusError> {
        let mut chars = self.name.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_is_legal = chars.all(|c| c.is_ascii_alphanumeric() || TOPIC_PUNCTUATION.contains(c));
        if starts_with_letter && rest_is_legal {
            Ok(())
        } else {
            Err(BusError::InvalidTopic(self.name.clone()))
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Topic::new(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Topic::new(name)
    }
}

/// Join `parts` with the topic separator, in order.
///
/// An empty list yields an empty topic name; callers are expected not to do that.
pub fn create_sub_topic<S: AsRef<str>>(parts: &[S]) -> Topic {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(TOPIC_SEPARATOR);
    Topic::new(joined)
}

/// Extract the device id from a `<prefix>_<deviceId>` topic, or `""` when the
/// topic does not follow the convention.
pub fn device_id_from_topic(topic: &Topic) -> &str {
    let name = topic.name();
    let Some(pos) = name.rfind(TOPIC_SEPARATOR) else {
        return "";
    };
    let device_id = &name[pos + TOPIC_SEPARATOR.len()..];
    if device_id.len() != DEVICE_ID_LENGTH {
        return "";
    }
    device_id
}
