pub mod mqtt_transport;

pub use mqtt_transport::{RumqttTransport, parse_broker_url};
