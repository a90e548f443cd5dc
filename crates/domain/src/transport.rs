use async_trait::async_trait;

use crate::error::DomainError;

/// MQTT transport that infrastructure implementations must provide
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session with the broker using `client_id` as MQTT client identifier
    async fn connect(&mut self, broker_url: &str, client_id: &str) -> Result<(), DomainError>;

    /// Close the session. Best-effort.
    async fn disconnect(&mut self) -> Result<(), DomainError>;

    /// Check if the session is currently up
    fn is_connected(&self) -> bool;

    /// Publish a message on a fully qualified topic
    async fn publish(&self, topic: &str, payload: &[u8], retained: bool)
    -> Result<(), DomainError>;
}

/// Sink for device-relative attributes (`$state`, `sensor/$type`, ...)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeSink: Send + Sync {
    /// Fire-and-forget: failures are handled by the implementation
    async fn publish(&self, attribute: &str, payload: &str, retained: bool);
}
