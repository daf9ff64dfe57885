//! Core configuration, loaded from YAML.
//!
//! ```yaml
//! default_topic: rwcore
//! core_topic: rwcore
//! request_timeout_ms: 10000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::Topic;
use crate::error::ConfigError;
use crate::rpc::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Topic this process consumes requests on.
    pub default_topic: String,
    /// Topic the core listens on; adapters address it.
    pub core_topic: String,
    pub request_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_topic: "rwcore".to_string(),
            core_topic: "rwcore".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl CoreConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("default_topic", &self.default_topic), ("core_topic", &self.core_topic)] {
            Topic::new(value.as_str())
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("{}: {}", field, e)))?;
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_topic: Topic::new(self.default_topic.as_str()),
            request_timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_config().default_topic, Topic::new("rwcore"));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CoreConfig::from_yaml_str("default_topic: openolt\n").unwrap();
        assert_eq!(config.default_topic, "openolt");
        assert_eq!(config.core_topic, "rwcore");
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CoreConfig::from_yaml_str("default_topic: 1bad"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_yaml_str("request_timeout_ms: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_yaml_str("request_timeout_ms: [1]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_topic: ponsim\nrequest_timeout_ms: 2500").unwrap();

        let config = CoreConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.default_topic, "ponsim");
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));

        let missing = CoreConfig::from_yaml_file(file.path().with_extension("absent"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
