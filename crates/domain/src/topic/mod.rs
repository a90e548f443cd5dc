mod topic_id;

pub use topic_id::TopicId;

/// Build the fully qualified topic of a device attribute: `{base}/{device}/{attribute}`.
pub fn build_topic(base_topic: &str, device_id: &str, attribute: &str) -> String {
    format!("{base_topic}/{device_id}/{attribute}")
}
