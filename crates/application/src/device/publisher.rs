use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{error, trace, warn};

use domain::{AttributeSink, Configuration, DeviceState, TopicId, Transport, build_topic};

/// Transport shared by the state machine loop and the stats task
pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Publishes device-relative attributes, gated on the Ready state
#[derive(Clone)]
pub struct DevicePublisher {
    transport: SharedTransport,
    base_topic: TopicId,
    device_id: TopicId,
    state: watch::Receiver<DeviceState>,
}

impl DevicePublisher {
    pub fn new(
        transport: SharedTransport,
        config: &Configuration,
        state: watch::Receiver<DeviceState>,
    ) -> Self {
        Self {
            transport,
            base_topic: config.base_topic().clone(),
            device_id: config.device_id().clone(),
            state,
        }
    }

    pub fn state(&self) -> DeviceState {
        *self.state.borrow()
    }

    /// Publish `{base}/{device}/{attribute}`.
    ///
    /// Does nothing outside Ready. Transport failures are logged, never returned.
    pub async fn publish(&self, attribute: &str, payload: &str, retained: bool) {
        let state = self.state();
        if !state.is_ready() {
            warn!(attribute = %attribute, state = %state, "Couldn't publish message - not connected");
            return;
        }

        let topic = build_topic(
            self.base_topic.as_str(),
            self.device_id.as_str(),
            attribute,
        );

        let transport = self.transport.lock().await;
        match transport.publish(&topic, payload.as_bytes(), retained).await {
            Ok(()) => trace!(topic = %topic, payload = %payload, "Published"),
            Err(e) => error!(topic = %topic, error = %e, "Couldn't publish message"),
        }
    }
}

#[async_trait]
impl AttributeSink for DevicePublisher {
    async fn publish(&self, attribute: &str, payload: &str, retained: bool) {
        DevicePublisher::publish(self, attribute, payload, retained).await
    }
}
