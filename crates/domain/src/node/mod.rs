mod entity;
mod registry;

pub use entity::{Node, NodeHandle, NodeHook};
pub use registry::NodeRegistry;
