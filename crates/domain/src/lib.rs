//! Domain layer - Pure Homie device model with no I/O
//!
//! This crate contains:
//! - Value Objects (TopicId, Configuration)
//! - The device lifecycle state and its transition table
//! - Nodes and the node registry
//! - Port interfaces (Transport, AttributeSink, MetricProvider)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Identifiers validated at construction
//! - Testable in isolation

pub mod configuration;
pub mod error;
pub mod metrics;
pub mod node;
pub mod state;
pub mod topic;
pub mod transport;

/// Homie convention version announced on `$homie`
pub const HOMIE_CONVENTION: &str = "3.0.0";

/// Implementation tag announced on `$implementation`
pub const IMPLEMENTATION: &str = "rust";

// Re-export commonly used types
pub use configuration::{Configuration, Firmware};
pub use error::DomainError;
pub use metrics::MetricProvider;
pub use node::{Node, NodeHandle, NodeHook, NodeRegistry};
pub use state::{DeviceState, TickEvent};
pub use topic::{TopicId, build_topic};
pub use transport::{AttributeSink, Transport};
