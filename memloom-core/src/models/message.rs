use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;

/// A single message within a `NormalizedConversation`.
///
/// Invariant: `content` is non-empty after trimming — parsers drop messages
/// that would violate this at parse time, so a constructed `NormalizedMessage`
/// can always be assumed non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Every field the source provider carried that memloom doesn't model
    /// explicitly — never discarded.
    #[serde(default)]
    pub metadata: Value,
}

impl NormalizedMessage {
    /// The concatenation used by the token counter: `"role: content"`.
    pub fn as_counted_text(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}
