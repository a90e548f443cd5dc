use config::{Config, ConfigError, Environment, File};
use domain::{Configuration, DomainError, Firmware, build_topic};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirmwareConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MqttConfig {
    #[serde(default = "default_broker_url")]
    pub broker_url: String,
}

fn default_broker_url() -> String {
    "tcp://localhost:1883".to_string()
}

/// Optional `$stats` readings. Uptime is always reported.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub cpu_temperature: bool,
    #[serde(default)]
    pub cpu_load: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub device_id: String,
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
    pub firmware: FirmwareConfig,
    pub mqtt: MqttConfig,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    #[serde(default = "default_disconnect_retry_ms")]
    pub disconnect_retry_ms: u64,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

fn default_base_topic() -> String {
    domain::configuration::DEFAULT_BASE_TOPIC.to_string()
}

fn default_stats_interval_ms() -> u64 {
    10_000
}

fn default_disconnect_retry_ms() -> u64 {
    2_000
}

impl AgentConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_with_mode(config_dir, &run_mode)
    }

    pub fn load_with_mode(config_dir: &str, run_mode: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("mqtt.broker_url", default_broker_url())?
            // config/default.toml must exist
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(true))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // e.g. HOMIE__MQTT__BROKER_URL=tcp://10.0.0.1:1883
            .add_source(Environment::with_prefix("HOMIE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Validated device settings. Identifiers and intervals are checked here.
    pub fn to_configuration(&self) -> Result<Configuration, DomainError> {
        let mut configuration = Configuration::new(&self.device_id, &self.mqtt.broker_url)?;
        configuration.set_base_topic(&self.base_topic)?;
        configuration.set_stats_interval(Duration::from_millis(self.stats_interval_ms))?;
        configuration.set_disconnect_retry(Duration::from_millis(self.disconnect_retry_ms))?;
        Ok(configuration)
    }

    pub fn firmware(&self) -> Firmware {
        Firmware::new(&self.firmware.name, &self.firmware.version)
    }

    /// Topic used for the broker-side Last Will
    pub fn state_topic(&self) -> String {
        build_topic(&self.base_topic, &self.device_id, "$state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_dir(default_toml: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("homie-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("default.toml"), default_toml).unwrap();
        dir
    }

    const MINIMAL: &str = r#"
device_id = "garage-sensor"

[firmware]
name = "garage-firmware"
version = "0.3.1"

[mqtt]
broker_url = "tcp://broker.local:1883"
"#;

    #[test]
    fn test_load_applies_defaults() {
        let dir = config_dir(MINIMAL);
        let config = AgentConfig::load_with_mode(dir.to_str().unwrap(), "test").unwrap();

        assert_eq!(config.device_id, "garage-sensor");
        assert_eq!(config.base_topic, "homie");
        assert_eq!(config.stats_interval_ms, 10_000);
        assert_eq!(config.disconnect_retry_ms, 2_000);
        assert!(!config.metrics.cpu_temperature);
        assert!(!config.metrics.cpu_load);
        assert!(config.nodes.is_empty());
        assert_eq!(config.state_topic(), "homie/garage-sensor/$state");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_run_mode_file_overrides_default() {
        let dir = config_dir(MINIMAL);
        std::fs::write(
            dir.join("field.toml"),
            r#"
base_topic = "devices"
stats_interval_ms = 5000

[metrics]
cpu_load = true

[[nodes]]
name = "door"
type = "contact"

[[nodes]]
name = "light"
type = "switch"
"#,
        )
        .unwrap();

        let config = AgentConfig::load_with_mode(dir.to_str().unwrap(), "field").unwrap();
        assert_eq!(config.base_topic, "devices");
        assert_eq!(config.stats_interval_ms, 5_000);
        assert!(config.metrics.cpu_load);
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].name, "door");
        assert_eq!(config.nodes[1].node_type, "switch");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_default_file_fails() {
        let dir = std::env::temp_dir().join(format!("homie-config-{}", uuid::Uuid::new_v4()));
        assert!(AgentConfig::load_with_mode(dir.to_str().unwrap(), "test").is_err());
    }

    #[test]
    fn test_to_configuration() {
        let dir = config_dir(MINIMAL);
        let config = AgentConfig::load_with_mode(dir.to_str().unwrap(), "test").unwrap();

        let configuration = config.to_configuration().unwrap();
        assert_eq!(configuration.device_id().as_str(), "garage-sensor");
        assert_eq!(configuration.broker_url(), "tcp://broker.local:1883");
        assert_eq!(configuration.stats_interval(), Duration::from_secs(10));
        assert_eq!(configuration.disconnect_retry(), Duration::from_secs(2));

        let firmware = config.firmware();
        assert_eq!(firmware.name, "garage-firmware");
        assert_eq!(firmware.version, "0.3.1");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_to_configuration_rejects_invalid_values() {
        let dir = config_dir(MINIMAL);
        let mut config = AgentConfig::load_with_mode(dir.to_str().unwrap(), "test").unwrap();

        config.device_id = "Garage_Sensor".to_string();
        assert!(matches!(
            config.to_configuration(),
            Err(DomainError::InvalidIdentifier(_))
        ));

        config.device_id = "garage-sensor".to_string();
        config.stats_interval_ms = 0;
        assert!(matches!(
            config.to_configuration(),
            Err(DomainError::InvalidConfiguration(_))
        ));

        std::fs::remove_dir_all(dir).ok();
    }
}
