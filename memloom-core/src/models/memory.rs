use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A durable, content-addressed fact extracted from a conversation.
///
/// Identity is the content-hash `id` (§3 of the spec), not allocation: two
/// memories with equal `id` are always the same entity, independent of how
/// many times they were independently extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMemory {
    pub id: String,
    pub memory_type: String,
    pub content: String,
    pub confidence: f64,
    pub workspace_id: String,
    pub conversation_id: String,
    pub source_message_ids: Vec<String>,
    #[serde(default)]
    pub source_chunk_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_from: Vec<String>,
}

/// Normalizes text identically on both sides of any equality check used for
/// hashing or duplicate detection: lowercase, collapse all whitespace runs
/// (including newlines/tabs) to a single space, then trim.
pub fn normalize_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Entity identity used when hashing `entity`-typed memories: normalized
/// `(entity_type, name)`, read out of `metadata`. Absent fields normalize to
/// the empty string so two entities both missing the field still collide
/// deterministically rather than hashing differently by accident.
fn entity_identity(memory_type: &str, metadata: &Value) -> Option<(String, String)> {
    if memory_type != "entity" {
        return None;
    }
    let entity_type = metadata
        .get("entity_type")
        .and_then(Value::as_str)
        .unwrap_or("");
    let name = metadata.get("entity_name").and_then(Value::as_str).unwrap_or("");
    Some((normalize_content(entity_type), normalize_content(name)))
}

/// Computes the deterministic content-hash id of a memory: SHA-256 over
/// `type | normalized-content | workspace-id | [entity-type, entity-name]`.
pub fn content_hash_id(
    memory_type: &str,
    content: &str,
    workspace_id: &str,
    metadata: &Value,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(memory_type.as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_content(content).as_bytes());
    hasher.update(b"|");
    hasher.update(workspace_id.as_bytes());
    if let Some((entity_type, name)) = entity_identity(memory_type, metadata) {
        hasher.update(b"|");
        hasher.update(entity_type.as_bytes());
        hasher.update(b",");
        hasher.update(name.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

impl ExtractedMemory {
    /// Recomputes and assigns `id` from the memory's current fields.
    pub fn assign_id(&mut self) {
        self.id = content_hash_id(
            &self.memory_type,
            &self.content,
            &self.workspace_id,
            &self.metadata,
        );
    }
}
