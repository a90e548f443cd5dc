use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Value object representing a Homie topic identifier
///
/// Rules:
/// - Must be non-empty
/// - Must contain only lowercase ASCII letters, digits and hyphens
/// - Must not start or end with a hyphen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(String);

impl TopicId {
    /// Create a new TopicId with validation
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "Topic ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::InvalidIdentifier(format!(
                "Topic ID {id} must contain only lowercase letters, digits and hyphens"
            )));
        }

        if id.starts_with('-') || id.ends_with('-') {
            return Err(DomainError::InvalidIdentifier(format!(
                "Topic ID {id} must not start or end with a hyphen"
            )));
        }

        Ok(Self(id))
    }

    /// Check a candidate without constructing it
    pub fn is_valid(id: &str) -> bool {
        Self::new(id).is_ok()
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TopicId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TopicId> for String {
    fn from(value: TopicId) -> Self {
        value.0
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topic_id() {
        let id = TopicId::new("kitchen-sensor-01").unwrap();
        assert_eq!(id.as_str(), "kitchen-sensor-01");
    }

    #[test]
    fn test_single_character_topic_id() {
        assert!(TopicId::new("a").is_ok());
        assert!(TopicId::new("7").is_ok());
        assert!(TopicId::new("-").is_err());
    }

    #[test]
    fn test_empty_topic_id() {
        let result = TopicId::new("");
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidIdentifier("Topic ID cannot be empty".to_string())
        );
    }

    #[test]
    fn test_topic_id_hyphen_edges() {
        assert!(TopicId::new("-dev").is_err());
        assert!(TopicId::new("dev-").is_err());
        assert!(TopicId::new("d-e-v").is_ok());
    }

    #[test]
    fn test_topic_id_invalid_characters() {
        for candidate in ["Dev1", "dev/1", "dev_1", "dev 1", "dév", "$state", "#"] {
            assert!(
                matches!(
                    TopicId::new(candidate),
                    Err(DomainError::InvalidIdentifier(_))
                ),
                "{candidate} should be rejected"
            );
        }
    }

    #[test]
    fn test_topic_id_display() {
        let id = TopicId::new("homie").unwrap();
        assert_eq!(format!("{}", id), "homie");
    }
}
