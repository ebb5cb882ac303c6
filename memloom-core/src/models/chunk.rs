use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::NormalizedMessage;

/// A token-budgeted, whole-message slice of a `NormalizedConversation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic `"{conversation_id}:{sequence}"`.
    pub id: String,
    pub conversation_id: String,
    /// 1-based.
    pub sequence: usize,
    pub total_chunks: usize,
    pub messages: Vec<NormalizedMessage>,
    pub token_count: usize,
    pub overlap_with_previous: usize,
    pub overlap_tokens_with_previous: usize,
    pub overlap_with_next: usize,
    pub overlap_tokens_with_next: usize,
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    /// Index of the first/last message of this chunk within the parent
    /// conversation's message list.
    pub start_index: usize,
    pub end_index: usize,
}

impl Chunk {
    pub fn deterministic_id(conversation_id: &str, sequence: usize) -> String {
        format!("{conversation_id}:{sequence}")
    }
}

/// Summary carried from chunk N to chunk N+1 in sequential orchestration.
/// Absent in parallel mode by design (§4.4) — modeled as a plain immutable
/// record, never shared mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkContext {
    pub summary: String,
    /// `(type, content)` pairs of memories extracted from the prior chunk.
    pub prior_memories: Vec<(String, String)>,
}

impl ChunkContext {
    /// The default summary format: `"Chunk N: M messages, K memories extracted"`.
    pub fn default_summary(
        sequence: usize,
        message_count: usize,
        memory_count: usize,
        prior_memories: Vec<(String, String)>,
    ) -> Self {
        Self {
            summary: format!(
                "Chunk {sequence}: {message_count} messages, {memory_count} memories extracted"
            ),
            prior_memories,
        }
    }
}
