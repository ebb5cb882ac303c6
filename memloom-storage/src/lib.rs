//! A `DashMap`-backed reference implementation of `StorageClient`, used by
//! integration tests and examples elsewhere in the workspace.
//!
//! This is explicitly a test double, not a persistence-engine design (the
//! Non-goal in spec §1 still holds): no SQL, no durability, no migrations.
//! Vector search is brute-force cosine similarity over whatever memories
//! happen to be resident, scoped to the requesting workspace.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use memloom_core::errors::StorageError;
use memloom_core::models::{ExtractedMemory, ExtractedRelationship};
use memloom_core::traits::{MemoryUpdate, ScoredMemory, SearchFilters, StorageClient};
use memloom_core::util::cosine_similarity;

/// Stores embeddings alongside memories so `search_memories` has something to
/// rank against; callers populate both via `put_with_vector`.
#[derive(Clone)]
struct StoredMemory {
    memory: ExtractedMemory,
    vector: Vec<f32>,
}

/// In-memory, workspace-scoped `StorageClient`. Memories are keyed by id;
/// relationships are keyed by `(from_memory_id)` for `get_memory_relationships`
/// lookups and also indexed by `to_memory_id` so expansion can walk either
/// direction — callers of `get_memory_relationships` see both.
#[derive(Default)]
pub struct InMemoryStorageClient {
    memories: DashMap<String, StoredMemory>,
    relationships: DashMap<String, Vec<ExtractedRelationship>>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a memory together with the embedding vector
    /// `search_memories` should rank it against. Real `StorageClient`
    /// implementations would compute this at write time from an
    /// `EmbeddingProvider`; this test double takes it directly so tests can
    /// construct deterministic vectors.
    pub fn put_with_vector(&self, memory: ExtractedMemory, vector: Vec<f32>) {
        self.memories.insert(memory.id.clone(), StoredMemory { memory, vector });
    }

    pub fn put_relationship(&self, relationship: ExtractedRelationship) {
        self.relationships
            .entry(relationship.from_memory_id.clone())
            .or_default()
            .push(relationship.clone());
        if relationship.to_memory_id != relationship.from_memory_id {
            self.relationships.entry(relationship.to_memory_id.clone()).or_default().push(relationship);
        }
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn search_memories(
        &self,
        workspace_id: &str,
        vector: &[f32],
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredMemory>, StorageError> {
        let mut scored: Vec<ScoredMemory> = self
            .memories
            .iter()
            .filter(|entry| entry.value().memory.workspace_id == workspace_id)
            .filter(|entry| passes_filters(&entry.value().memory, filters))
            .map(|entry| ScoredMemory {
                memory: entry.value().memory.clone(),
                score: cosine_similarity(vector, &entry.value().vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        if filters.limit > 0 {
            scored.truncate(filters.limit);
        }
        debug!(workspace_id, result_count = scored.len(), "in-memory vector search complete");
        Ok(scored)
    }

    async fn get_memory(&self, id: &str, workspace_id: &str) -> Result<Option<ExtractedMemory>, StorageError> {
        Ok(self
            .memories
            .get(id)
            .map(|entry| entry.value().memory.clone())
            .filter(|memory| memory.workspace_id == workspace_id))
    }

    async fn get_memory_relationships(
        &self,
        memory_id: &str,
        workspace_id: &str,
    ) -> Result<Vec<ExtractedRelationship>, StorageError> {
        let Some(memory) = self.get_memory(memory_id, workspace_id).await? else {
            return Ok(Vec::new());
        };
        let _ = memory;
        Ok(self
            .relationships
            .get(memory_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn save_memory(&self, memory: ExtractedMemory) -> Result<(), StorageError> {
        self.memories.entry(memory.id.clone()).and_modify(|existing| existing.memory = memory.clone()).or_insert(StoredMemory {
            memory,
            vector: Vec::new(),
        });
        Ok(())
    }

    async fn save_relationship(&self, relationship: ExtractedRelationship) -> Result<(), StorageError> {
        self.put_relationship(relationship);
        Ok(())
    }

    async fn update_memory(
        &self,
        id: &str,
        workspace_id: &str,
        update: MemoryUpdate,
    ) -> Result<Option<ExtractedMemory>, StorageError> {
        let Some(mut entry) = self.memories.get_mut(id) else {
            return Ok(None);
        };
        if entry.memory.workspace_id != workspace_id {
            return Ok(None);
        }
        if let Some(content) = update.content {
            entry.memory.content = content;
        }
        if let Some(metadata) = update.metadata {
            entry.memory.metadata = metadata;
        }
        Ok(Some(entry.memory.clone()))
    }
}

fn passes_filters(memory: &ExtractedMemory, filters: &SearchFilters) -> bool {
    if let Some(types) = &filters.types {
        if !types.iter().any(|t| t == &memory.memory_type) {
            return false;
        }
    }
    if let Some(from) = filters.date_from {
        if memory.created_at < from {
            return false;
        }
    }
    if let Some(to) = filters.date_to {
        if memory.created_at > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn memory(id: &str, workspace_id: &str) -> ExtractedMemory {
        ExtractedMemory {
            id: id.to_string(),
            memory_type: "fact".to_string(),
            content: "some content".to_string(),
            confidence: 0.8,
            workspace_id: workspace_id.to_string(),
            conversation_id: "conv-1".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    #[tokio::test]
    async fn search_is_scoped_to_workspace() {
        let store = InMemoryStorageClient::new();
        store.put_with_vector(memory("a", "ws1"), vec![1.0, 0.0]);
        store.put_with_vector(memory("b", "ws2"), vec![1.0, 0.0]);

        let filters = SearchFilters { limit: 10, ..Default::default() };
        let results = store.search_memories("ws1", &[1.0, 0.0], &filters).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, "a");
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity_descending() {
        let store = InMemoryStorageClient::new();
        store.put_with_vector(memory("close", "ws1"), vec![1.0, 0.1]);
        store.put_with_vector(memory("far", "ws1"), vec![0.1, 1.0]);

        let filters = SearchFilters { limit: 10, ..Default::default() };
        let results = store.search_memories("ws1", &[1.0, 0.0], &filters).await.unwrap();
        assert_eq!(results[0].memory.id, "close");
        assert_eq!(results[1].memory.id, "far");
    }

    #[tokio::test]
    async fn get_memory_returns_none_across_workspace_boundary() {
        let store = InMemoryStorageClient::new();
        store.put_with_vector(memory("a", "ws1"), vec![1.0]);
        assert!(store.get_memory("a", "ws2").await.unwrap().is_none());
        assert!(store.get_memory("a", "ws1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_memory_ignores_non_whitelisted_fields_and_respects_workspace() {
        let store = InMemoryStorageClient::new();
        store.put_with_vector(memory("a", "ws1"), vec![1.0]);

        let update = MemoryUpdate { content: Some("updated".to_string()), metadata: None };
        let updated = store.update_memory("a", "ws1", update).await.unwrap().unwrap();
        assert_eq!(updated.content, "updated");
        assert_eq!(updated.confidence, 0.8, "confidence is not in the update whitelist");

        let cross_workspace = store
            .update_memory("a", "ws2", MemoryUpdate { content: Some("nope".to_string()), metadata: None })
            .await
            .unwrap();
        assert!(cross_workspace.is_none());
    }

    #[tokio::test]
    async fn relationships_are_retrievable_from_either_endpoint() {
        let store = InMemoryStorageClient::new();
        store.put_with_vector(memory("a", "ws1"), vec![1.0]);
        store.put_with_vector(memory("b", "ws1"), vec![1.0]);
        store.put_relationship(ExtractedRelationship {
            id: "r1".to_string(),
            from_memory_id: "a".to_string(),
            to_memory_id: "b".to_string(),
            relationship_type: "related_to".to_string(),
            confidence: 0.9,
            created_at: chrono::Utc::now(),
        });

        let from_a = store.get_memory_relationships("a", "ws1").await.unwrap();
        let from_b = store.get_memory_relationships("b", "ws1").await.unwrap();
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_b.len(), 1);
    }
}
