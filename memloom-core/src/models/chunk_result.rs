use serde::{Deserialize, Serialize};

use super::memory::ExtractedMemory;
use super::relationship::ExtractedRelationship;
use crate::errors::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Success,
    Failed,
}

/// The outcome of extraction for a single chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_id: String,
    pub status: ChunkStatus,
    pub memories: Vec<ExtractedMemory>,
    pub relationships: Vec<ExtractedRelationship>,
    pub tokens_processed: usize,
    pub duration_ms: u64,
    pub error: Option<ChunkResultError>,
}

/// The serializable shape of an extraction failure attached to a `ChunkResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResultError {
    pub kind: String,
    pub provider: String,
    pub message: String,
    pub cause: Option<String>,
}

impl From<&ExtractionError> for ChunkResultError {
    fn from(err: &ExtractionError) -> Self {
        match err {
            ExtractionError::LlmFailed {
                provider,
                message,
                cause,
                ..
            } => ChunkResultError {
                kind: "llm_error".to_string(),
                provider: provider.clone(),
                message: message.clone(),
                cause: cause.as_ref().map(|c| c.0.clone()),
            },
            ExtractionError::Timeout { context_id, .. } => ChunkResultError {
                kind: "llm_error".to_string(),
                provider: "unknown".to_string(),
                message: format!("timed out processing {context_id}"),
                cause: None,
            },
            ExtractionError::SchemaMismatch(msg) => ChunkResultError {
                kind: "llm_error".to_string(),
                provider: "unknown".to_string(),
                message: msg.clone(),
                cause: None,
            },
        }
    }
}

impl ChunkResult {
    pub fn failed(chunk_id: String, tokens_processed: usize, duration_ms: u64, error: &ExtractionError) -> Self {
        Self {
            chunk_id,
            status: ChunkStatus::Failed,
            memories: Vec::new(),
            relationships: Vec::new(),
            tokens_processed,
            duration_ms,
            error: Some(error.into()),
        }
    }

    pub fn success(
        chunk_id: String,
        memories: Vec<ExtractedMemory>,
        relationships: Vec<ExtractedRelationship>,
        tokens_processed: usize,
        duration_ms: u64,
    ) -> Self {
        Self {
            chunk_id,
            status: ChunkStatus::Success,
            memories,
            relationships,
            tokens_processed,
            duration_ms,
            error: None,
        }
    }
}
