use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use domain::{DomainError, Transport};

const DEFAULT_PORT: u16 = 1883;
const REQUESTS_CAP: usize = 100;
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// [`Transport`] backed by a rumqttc session.
///
/// Each `connect` builds a new client and event loop; the event loop task stops
/// on the first connection error so that reconnection stays with the caller.
pub struct RumqttTransport {
    client: Option<AsyncClient>,
    event_loop_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    last_will: Option<LastWill>,
    keep_alive: Duration,
    connect_timeout: Duration,
}

impl Default for RumqttTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RumqttTransport {
    pub fn new() -> Self {
        Self {
            client: None,
            event_loop_task: None,
            connected: Arc::new(AtomicBool::new(false)),
            last_will: None,
            keep_alive: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Retained message the broker publishes if the session dies uncleanly
    pub fn with_last_will(mut self, topic: impl Into<String>, payload: impl Into<String>) -> Self {
        self.last_will = Some(LastWill::new(
            topic,
            payload.into(),
            QoS::AtLeastOnce,
            true,
        ));
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    fn teardown(&mut self) {
        if let Some(task) = self.event_loop_task.take() {
            task.abort();
        }
        self.client = None;
        self.connected.store(false, Ordering::Relaxed);
    }
}

#[async_trait]
impl Transport for RumqttTransport {
    async fn connect(&mut self, broker_url: &str, client_id: &str) -> Result<(), DomainError> {
        self.teardown();

        let (host, port) = parse_broker_url(broker_url)?;
        let mut options = MqttOptions::new(client_id, host.clone(), port);
        options.set_keep_alive(self.keep_alive);
        if let Some(will) = &self.last_will {
            options.set_last_will(will.clone());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUESTS_CAP);
        let connected = Arc::new(AtomicBool::new(false));
        let (ack_tx, ack_rx) = oneshot::channel();
        let task = tokio::spawn(drive_event_loop(event_loop, connected.clone(), ack_tx));

        let outcome = match timeout(self.connect_timeout, ack_rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(reason),
            Ok(Err(_)) => Err("event loop stopped before ConnAck".to_string()),
            Err(_) => Err(format!("no ConnAck within {:?}", self.connect_timeout)),
        };

        match outcome {
            Ok(()) => {
                info!(host = %host, port = port, client_id = %client_id, "MQTT session established");
                self.client = Some(client);
                self.event_loop_task = Some(task);
                self.connected = connected;
                Ok(())
            }
            Err(reason) => {
                task.abort();
                Err(DomainError::ConnectFailure(format!(
                    "{host}:{port}: {reason}"
                )))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), DomainError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        let result = client
            .try_disconnect()
            .map_err(|e| DomainError::ConnectFailure(format!("Failed to disconnect: {e}")));

        if let Some(mut task) = self.event_loop_task.take() {
            if timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
                warn!("MQTT event loop did not stop in time");
                task.abort();
            }
        }
        self.connected.store(false, Ordering::Relaxed);
        result
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<(), DomainError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| DomainError::PublishFailure("No MQTT session".to_string()))?;

        // try_publish never waits on a full request queue
        client
            .try_publish(topic, QoS::AtLeastOnce, retained, payload)
            .map_err(|e| {
                DomainError::PublishFailure(format!("Failed to publish MQTT message on {topic}: {e}"))
            })
    }
}

async fn drive_event_loop(
    mut event_loop: EventLoop,
    connected: Arc<AtomicBool>,
    ack: oneshot::Sender<Result<(), String>>,
) {
    let mut ack = Some(ack);
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT Connected");
                connected.store(true, Ordering::Relaxed);
                if let Some(tx) = ack.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT Disconnect sent");
                connected.store(false, Ordering::Relaxed);
                break;
            }
            Ok(notification) => trace!(?notification, "MQTT event"),
            Err(e) => {
                connected.store(false, Ordering::Relaxed);
                match ack.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(e.to_string()));
                    }
                    None => error!("MQTT Connection error: {:?}", e),
                }
                break;
            }
        }
    }
}

/// Split `tcp://host:port`, `mqtt://host:port`, `host:port` or `host` into host and port
pub fn parse_broker_url(url: &str) -> Result<(String, u16), DomainError> {
    let rest = match url.split_once("://") {
        Some(("tcp" | "mqtt", rest)) => rest,
        Some((scheme, _)) => {
            return Err(DomainError::InvalidConfiguration(format!(
                "Unsupported broker scheme {scheme} in {url}"
            )));
        }
        None => url,
    };
    let rest = rest.trim_end_matches('/');

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                DomainError::InvalidConfiguration(format!("Invalid broker port in {url}"))
            })?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(DomainError::InvalidConfiguration(format!(
            "Missing broker host in {url}"
        )));
    }

    Ok((host.to_string(), port))
}
