use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use domain::{
    Configuration, DeviceState, Firmware, MetricProvider, Node, NodeHandle, NodeRegistry,
    TopicId, Transport,
};

use super::{DevicePublisher, DeviceStateMachine, SharedTransport};
use crate::stats::{StatsHandle, StatsReporter, StatsScheduler};

/// A Homie device before it is started: configuration, firmware, nodes and
/// optional metric providers.
pub struct HomieDevice {
    config: Configuration,
    firmware: Firmware,
    transport: Box<dyn Transport>,
    nodes: NodeRegistry,
    cpu_temperature: Option<Arc<dyn MetricProvider>>,
    cpu_load: Option<Arc<dyn MetricProvider>>,
    boot: Instant,
}

impl HomieDevice {
    pub fn new(
        config: Configuration,
        firmware: Firmware,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            config,
            firmware,
            transport: Box::new(transport),
            nodes: NodeRegistry::new(),
            cpu_temperature: None,
            cpu_load: None,
            boot: Instant::now(),
        }
    }

    /// Report `$stats/cputemp` from this provider
    pub fn with_cpu_temperature(mut self, provider: impl MetricProvider + 'static) -> Self {
        self.cpu_temperature = Some(Arc::new(provider));
        self
    }

    /// Report `$stats/cpuload` from this provider
    pub fn with_cpu_load(mut self, provider: impl MetricProvider + 'static) -> Self {
        self.cpu_load = Some(Arc::new(provider));
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Register a node, or get the one already registered under `name`
    pub fn create_node(
        &mut self,
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> domain::error::Result<NodeHandle> {
        self.nodes.create_node(name, node_type)
    }

    pub fn register_node(&mut self, node: Node) -> NodeHandle {
        self.nodes.register(node)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.names()
    }

    /// Spawn the state machine loop and the stats scheduler
    pub fn start(self) -> DeviceHandle {
        let device_id = self.config.device_id().clone();
        info!(
            device_id = %device_id,
            broker_url = %self.config.broker_url(),
            nodes = self.nodes.len(),
            "Starting Homie device"
        );

        let transport: SharedTransport = Arc::new(Mutex::new(self.transport));
        let (state_tx, state_rx) = watch::channel(DeviceState::Init);
        let publisher = DevicePublisher::new(transport.clone(), &self.config, state_rx.clone());

        let reporter = StatsReporter::new(
            publisher.clone(),
            self.boot,
            self.cpu_temperature,
            self.cpu_load,
        );
        let (stats, stats_task) = StatsScheduler::spawn(reporter);

        let cancel_token = CancellationToken::new();
        let machine = DeviceStateMachine::new(
            self.config,
            self.firmware,
            self.nodes,
            transport.clone(),
            publisher.clone(),
            stats.clone(),
            state_tx,
            cancel_token.clone(),
        );
        let loop_task = tokio::spawn(machine.run());

        DeviceHandle {
            device_id,
            transport,
            publisher,
            state: state_rx,
            stats,
            stats_task,
            loop_task,
            cancel_token,
        }
    }
}

/// A running Homie device
pub struct DeviceHandle {
    device_id: TopicId,
    transport: SharedTransport,
    publisher: DevicePublisher,
    state: watch::Receiver<DeviceState>,
    stats: StatsHandle,
    stats_task: JoinHandle<()>,
    loop_task: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl DeviceHandle {
    pub fn device_id(&self) -> &TopicId {
        &self.device_id
    }

    pub fn state(&self) -> DeviceState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DeviceState> {
        self.state.clone()
    }

    /// Publisher for node property values
    pub fn publisher(&self) -> DevicePublisher {
        self.publisher.clone()
    }

    /// See [`DevicePublisher::publish`]
    pub async fn publish(&self, attribute: &str, payload: &str, retained: bool) {
        self.publisher.publish(attribute, payload, retained).await;
    }

    /// Stop the loop, stop stats, announce `disconnected`, close the transport
    pub async fn shutdown(self) -> Result<()> {
        let DeviceHandle {
            device_id,
            transport,
            publisher,
            state,
            stats,
            stats_task,
            loop_task,
            cancel_token,
        } = self;

        info!(device_id = %device_id, "Shutdown request received");
        cancel_token.cancel();

        // Teardown continues past a failed task; the first failure is returned last
        let mut failure = None;
        if let Err(e) = loop_task.await {
            error!(device_id = %device_id, error = %e, "State machine task failed");
            failure = Some(anyhow!(e).context("State machine task failed"));
        }

        stats.disarm().await;
        drop(stats);
        if let Err(e) = stats_task.await {
            error!(device_id = %device_id, error = %e, "Stats scheduler task failed");
            if failure.is_none() {
                failure = Some(anyhow!(e).context("Stats scheduler task failed"));
            }
        }

        if state.borrow().is_ready() {
            publisher
                .publish("$state", DeviceState::Disconnected.as_str(), true)
                .await;
        }

        let mut transport = transport.lock().await;
        if let Err(e) = transport.disconnect().await {
            info!(device_id = %device_id, error = %e, "Failed to disconnect");
        }

        info!(device_id = %device_id, "Terminating");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
