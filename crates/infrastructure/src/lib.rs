//! Infrastructure layer - MQTT transport, configuration files and host metrics

pub mod config;
pub mod messaging;
pub mod metrics;

pub use config::AgentConfig;
pub use messaging::RumqttTransport;
pub use metrics::{LoadAverage, ThermalZoneTemperature};
