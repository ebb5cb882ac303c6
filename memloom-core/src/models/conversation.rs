use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::NormalizedMessage;

/// A provider-agnostic conversation export, after parsing and normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedConversation {
    pub id: String,
    pub provider: String,
    /// The provider's own id for this conversation, if it has a stable one.
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<NormalizedMessage>,
    #[serde(default)]
    pub metadata: Value,
}

impl NormalizedConversation {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
