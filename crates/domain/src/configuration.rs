use std::time::Duration;

use crate::error::{DomainError, Result};
use crate::topic::{TopicId, build_topic};

pub const DEFAULT_BASE_TOPIC: &str = "homie";
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_DISCONNECT_RETRY: Duration = Duration::from_millis(2_000);

/// Device identity, broker address and timing of a Homie device.
///
/// Identifiers are validated when set; a rejected value leaves the previous one
/// in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    device_id: TopicId,
    broker_url: String,
    base_topic: TopicId,
    stats_interval: Duration,
    disconnect_retry: Duration,
}

impl Configuration {
    /// Create a configuration with default base topic and timings
    pub fn new(device_id: impl Into<String>, broker_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            device_id: TopicId::new(device_id)?,
            broker_url: broker_url.into(),
            base_topic: TopicId::new(DEFAULT_BASE_TOPIC)?,
            stats_interval: DEFAULT_STATS_INTERVAL,
            disconnect_retry: DEFAULT_DISCONNECT_RETRY,
        })
    }

    pub fn device_id(&self) -> &TopicId {
        &self.device_id
    }

    pub fn set_device_id(&mut self, device_id: impl Into<String>) -> Result<()> {
        self.device_id = TopicId::new(device_id)?;
        Ok(())
    }

    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }

    pub fn set_broker_url(&mut self, broker_url: impl Into<String>) {
        self.broker_url = broker_url.into();
    }

    pub fn base_topic(&self) -> &TopicId {
        &self.base_topic
    }

    pub fn set_base_topic(&mut self, base_topic: impl Into<String>) -> Result<()> {
        self.base_topic = TopicId::new(base_topic)?;
        Ok(())
    }

    pub fn stats_interval(&self) -> Duration {
        self.stats_interval
    }

    pub fn set_stats_interval(&mut self, interval: Duration) -> Result<()> {
        self.stats_interval = non_zero("stats interval", interval)?;
        Ok(())
    }

    pub fn disconnect_retry(&self) -> Duration {
        self.disconnect_retry
    }

    pub fn set_disconnect_retry(&mut self, delay: Duration) -> Result<()> {
        self.disconnect_retry = non_zero("disconnect retry delay", delay)?;
        Ok(())
    }

    /// Fully qualified topic of a device-relative attribute
    pub fn topic_for(&self, attribute: &str) -> String {
        build_topic(self.base_topic.as_str(), self.device_id.as_str(), attribute)
    }
}

/// Firmware announced on `$fw/name` and `$fw/version`. Both values are opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    pub name: String,
    pub version: String,
}

impl Firmware {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

fn non_zero(what: &str, value: Duration) -> Result<Duration> {
    if value.is_zero() {
        return Err(DomainError::InvalidConfiguration(format!(
            "{what} must be positive"
        )));
    }
    Ok(value)
}
