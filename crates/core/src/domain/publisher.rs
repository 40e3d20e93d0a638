use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace owner record required to create a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherRef {
    pub id: Uuid,
    pub unique_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_prefix: Option<String>,
}

impl PublisherRef {
    pub fn new(id: Uuid, unique_name: impl Into<String>) -> Self {
        Self {
            id,
            unique_name: unique_name.into(),
            customization_prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.customization_prefix = Some(prefix.into());
        self
    }
}
