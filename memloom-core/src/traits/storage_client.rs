use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::StorageError;
use crate::models::ExtractedMemory;

/// Filters passed to `searchMemories` (§6). All operations are
/// workspace-scoped; an implementation must return empty/`None` rather than
/// leaking data across a workspace boundary.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub limit: usize,
    pub types: Option<Vec<String>>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: ExtractedMemory,
    pub score: f64,
}

/// Fields `updateMemory` is allowed to touch; everything else is ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    pub content: Option<String>,
    pub metadata: Option<Value>,
}

/// The persistence and vector-search collaborator memloom consumes.
/// Not implemented as a persistence engine here (see `memloom-storage` for a
/// reference in-memory test double) — production implementations are an
/// external concern per the spec's non-goals.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn search_memories(
        &self,
        workspace_id: &str,
        vector: &[f32],
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredMemory>, StorageError>;

    async fn get_memory(
        &self,
        id: &str,
        workspace_id: &str,
    ) -> Result<Option<ExtractedMemory>, StorageError>;

    async fn get_memory_relationships(
        &self,
        memory_id: &str,
        workspace_id: &str,
    ) -> Result<Vec<crate::models::ExtractedRelationship>, StorageError>;

    async fn save_memory(&self, memory: ExtractedMemory) -> Result<(), StorageError>;

    async fn save_relationship(
        &self,
        relationship: crate::models::ExtractedRelationship,
    ) -> Result<(), StorageError>;

    async fn update_memory(
        &self,
        id: &str,
        workspace_id: &str,
        update: MemoryUpdate,
    ) -> Result<Option<ExtractedMemory>, StorageError>;
}
