use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::topic::TopicId;
use crate::transport::AttributeSink;

/// Shared handle to a registered node
pub type NodeHandle = Arc<Node>;

/// Extra work a node performs each time the device (re)connects,
/// e.g. announcing its properties.
#[async_trait]
pub trait NodeHook: Send + Sync {
    async fn on_connect(&self, node: &Node, sink: &dyn AttributeSink);
}

/// A functional unit of a device (a sensor, a relay, ...)
pub struct Node {
    name: TopicId,
    node_type: String,
    hook: Option<Box<dyn NodeHook>>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: TopicId::new(name)?,
            node_type: node_type.into(),
            hook: None,
        })
    }

    pub fn with_hook(mut self, hook: impl NodeHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Announce the node attributes, then run the user hook if any
    pub async fn on_connect(&self, sink: &dyn AttributeSink) {
        sink.publish(&self.attribute("$name"), self.name(), true)
            .await;
        sink.publish(&self.attribute("$type"), &self.node_type, true)
            .await;

        if let Some(hook) = &self.hook {
            hook.on_connect(self, sink).await;
        }
    }

    /// Device-relative path of a node attribute: `{node}/{attribute}`
    pub fn attribute(&self, attribute: &str) -> String {
        format!("{}/{}", self.name, attribute)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("node_type", &self.node_type)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;
    use crate::transport::MockAttributeSink;
    use mockall::Sequence;

    #[test]
    fn test_node_creation() {
        let node = Node::new("thermometer", "temperature").unwrap();
        assert_eq!(node.name(), "thermometer");
        assert_eq!(node.node_type(), "temperature");
        assert_eq!(node.attribute("$type"), "thermometer/$type");
    }

    #[test]
    fn test_node_name_must_be_topic_id() {
        let result = Node::new("Living Room", "light");
        assert!(matches!(result, Err(DomainError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_on_connect_publishes_node_attributes() {
        let mut sink = MockAttributeSink::new();
        let mut seq = Sequence::new();
        sink.expect_publish()
            .withf(|attribute, payload, retained| {
                attribute == "door/$name" && payload == "door" && *retained
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_publish()
            .withf(|attribute, payload, retained| {
                attribute == "door/$type" && payload == "contact" && *retained
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let node = Node::new("door", "contact").unwrap();
        node.on_connect(&sink).await;
    }

    struct PropertiesHook;

    #[async_trait]
    impl NodeHook for PropertiesHook {
        async fn on_connect(&self, node: &Node, sink: &dyn AttributeSink) {
            sink.publish(&node.attribute("$properties"), "open", true)
                .await;
        }
    }

    #[tokio::test]
    async fn test_hook_runs_after_node_attributes() {
        let mut sink = MockAttributeSink::new();
        let mut seq = Sequence::new();
        sink.expect_publish()
            .withf(|attribute, _, _| attribute == "door/$name")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_publish()
            .withf(|attribute, _, _| attribute == "door/$type")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_publish()
            .withf(|attribute, payload, _| attribute == "door/$properties" && payload == "open")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let node = Node::new("door", "contact")
            .unwrap()
            .with_hook(PropertiesHook);
        node.on_connect(&sink).await;
    }
}
