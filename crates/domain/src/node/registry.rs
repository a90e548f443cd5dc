use std::sync::Arc;

use super::{Node, NodeHandle};
use crate::error::Result;

/// Registered nodes of a device, in registration order. Names are unique.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<NodeHandle>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, or return the existing one with the same name.
    ///
    /// On a repeat call `node_type` is ignored.
    pub fn create_node(
        &mut self,
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Result<NodeHandle> {
        let name = name.into();
        if let Some(existing) = self.get(&name) {
            return Ok(existing);
        }
        Ok(self.insert(Node::new(name, node_type)?))
    }

    /// Register a fully built node; the existing one wins on a name clash
    pub fn register(&mut self, node: Node) -> NodeHandle {
        match self.get(node.name()) {
            Some(existing) => existing,
            None => self.insert(node),
        }
    }

    pub fn get(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.iter().find(|n| n.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    /// Value of the `$nodes` device attribute
    pub fn nodes_attribute(&self) -> String {
        self.names().join(",")
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeHandle> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: Node) -> NodeHandle {
        let handle = Arc::new(node);
        self.nodes.push(handle.clone());
        handle
    }
}
