use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use domain::{
    Configuration, DeviceState, DomainError, Firmware, HOMIE_CONVENTION, IMPLEMENTATION,
    NodeRegistry, TickEvent,
};

use super::{DevicePublisher, SharedTransport};
use crate::stats::StatsHandle;

/// Pause between two ticks of the loop
pub(crate) const TICK: Duration = Duration::from_millis(100);

/// Drives the device lifecycle: Init -> Ready <-> Disconnected.
///
/// Entry and exit actions run exactly once per state change, from [`Self::apply`].
pub struct DeviceStateMachine {
    config: Configuration,
    firmware: Firmware,
    nodes: NodeRegistry,
    transport: SharedTransport,
    publisher: DevicePublisher,
    stats: StatsHandle,
    state: watch::Sender<DeviceState>,
    cancel_token: CancellationToken,
}

impl DeviceStateMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Configuration,
        firmware: Firmware,
        nodes: NodeRegistry,
        transport: SharedTransport,
        publisher: DevicePublisher,
        stats: StatsHandle,
        state: watch::Sender<DeviceState>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            firmware,
            nodes,
            transport,
            publisher,
            stats,
            state,
            cancel_token,
        }
    }

    pub fn current(&self) -> DeviceState {
        *self.state.borrow()
    }

    /// Run until the cancel token fires
    pub async fn run(mut self) {
        let initial = self.current();
        self.on_enter(initial).await;

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            match self.tick().await {
                Ok(Some(event)) => self.apply(event).await,
                Ok(None) => {}
                Err(DomainError::LoopInterrupted) => {
                    warn!(device_id = %self.config.device_id(), "State machine interrupted");
                    break;
                }
                Err(e) => error!(device_id = %self.config.device_id(), error = %e, "Tick failed"),
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = sleep(TICK) => {}
            }
        }

        info!(device_id = %self.config.device_id(), state = %self.current(), "State machine stopped");
    }

    /// Work of the current state, reduced to an event for the transition table
    async fn tick(&mut self) -> Result<Option<TickEvent>, DomainError> {
        match self.current() {
            DeviceState::Init => Ok(Some(self.connect_event().await)),
            DeviceState::Ready => {
                let connected = self.transport.lock().await.is_connected();
                Ok(Some(if connected {
                    TickEvent::LinkAlive
                } else {
                    TickEvent::LinkLost
                }))
            }
            DeviceState::Disconnected => {
                tokio::select! {
                    _ = self.cancel_token.cancelled() => return Err(DomainError::LoopInterrupted),
                    _ = sleep(self.config.disconnect_retry()) => {}
                }
                Ok(Some(self.connect_event().await))
            }
            DeviceState::Sleeping | DeviceState::Lost | DeviceState::Alert => Ok(None),
        }
    }

    async fn apply(&mut self, event: TickEvent) {
        let current = self.current();
        let Some(next) = current.next(event) else {
            return;
        };

        self.on_exit(current).await;
        self.state.send_replace(next);
        self.on_enter(next).await;
    }

    async fn on_enter(&mut self, state: DeviceState) {
        info!(device_id = %self.config.device_id(), "--> {}", state);

        match state {
            DeviceState::Ready => {
                self.on_connect().await;
                self.stats.arm(self.config.stats_interval()).await;
            }
            DeviceState::Init
            | DeviceState::Disconnected
            | DeviceState::Sleeping
            | DeviceState::Lost
            | DeviceState::Alert => {}
        }
    }

    async fn on_exit(&mut self, state: DeviceState) {
        match state {
            DeviceState::Ready => self.stats.disarm().await,
            DeviceState::Init
            | DeviceState::Disconnected
            | DeviceState::Sleeping
            | DeviceState::Lost
            | DeviceState::Alert => {}
        }
    }

    async fn connect_event(&mut self) -> TickEvent {
        if self.connect().await {
            TickEvent::ConnectSucceeded
        } else {
            TickEvent::ConnectFailed
        }
    }

    /// Open a fresh broker session. Failures are logged and reported as `false`.
    async fn connect(&mut self) -> bool {
        let result = {
            let mut transport = self.transport.lock().await;

            if transport.is_connected() {
                if let Err(e) = transport.disconnect().await {
                    warn!(error = %e, "Failed to reset existing connection");
                }
            }

            transport
                .connect(self.config.broker_url(), self.config.device_id().as_str())
                .await
        };

        match result {
            Ok(()) => {
                self.stats.disarm().await;
                true
            }
            Err(e) => {
                error!(
                    device_id = %self.config.device_id(),
                    broker_url = %self.config.broker_url(),
                    error = %e,
                    "Couldn't connect"
                );
                false
            }
        }
    }

    /// Announce the device: attributes, then `$nodes`, then each node
    async fn on_connect(&self) {
        self.send_attributes().await;
        self.publish_nodes().await;
    }

    async fn send_attributes(&self) {
        let publisher = &self.publisher;
        publisher.publish("$homie", HOMIE_CONVENTION, true).await;
        publisher
            .publish("$name", self.config.device_id().as_str(), true)
            .await;
        publisher
            .publish("$state", self.current().as_str(), true)
            .await;
        publisher
            .publish("$implementation", IMPLEMENTATION, true)
            .await;
        publisher
            .publish(
                "$stats/interval",
                &self.config.stats_interval().as_millis().to_string(),
                true,
            )
            .await;
        publisher
            .publish("$fw/name", &self.firmware.name, true)
            .await;
        publisher
            .publish("$fw/version", &self.firmware.version, true)
            .await;
    }

    async fn publish_nodes(&self) {
        self.publisher
            .publish("$nodes", &self.nodes.nodes_attribute(), true)
            .await;

        for node in self.nodes.iter() {
            node.on_connect(&self.publisher).await;
        }
    }
}
