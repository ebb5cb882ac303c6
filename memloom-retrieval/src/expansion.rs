use std::collections::HashSet;

use memloom_core::errors::RetrievalError;
use memloom_core::traits::StorageClient;

use crate::types::{ExpansionInfo, SearchResult};

/// Depth is clamped to `[1, 10]` (spec §4.8).
pub fn clamp_depth(depth: usize) -> usize {
    depth.clamp(1, 10)
}

/// Starting from each of `seed`'s memories, follows relationships up to
/// `depth` hops, fetching each newly-reached memory from `storage`. A
/// single seen-id set spans the whole traversal, so a memory reachable via
/// multiple paths is fetched and added at most once — at whichever
/// relationship/depth first reached it (spec §4.8).
pub async fn expand(
    storage: &dyn StorageClient,
    workspace_id: &str,
    seed: &[SearchResult],
    depth: usize,
) -> Result<Vec<SearchResult>, RetrievalError> {
    let depth = clamp_depth(depth);
    let mut seen: HashSet<String> = seed.iter().map(|r| r.memory.id.clone()).collect();
    let mut added = Vec::new();
    let mut frontier: Vec<String> = seed.iter().map(|r| r.memory.id.clone()).collect();

    for current_depth in 1..=depth {
        if frontier.is_empty() {
            break;
        }
        let mut next_frontier = Vec::new();
        for memory_id in &frontier {
            let relationships = storage
                .get_memory_relationships(memory_id, workspace_id)
                .await
                .map_err(|err| RetrievalError::StorageError(err.to_string()))?;
            for relationship in relationships {
                let other_id = if &relationship.from_memory_id == memory_id {
                    relationship.to_memory_id.clone()
                } else {
                    relationship.from_memory_id.clone()
                };
                if !seen.insert(other_id.clone()) {
                    continue;
                }
                let Some(other_memory) = storage
                    .get_memory(&other_id, workspace_id)
                    .await
                    .map_err(|err| RetrievalError::StorageError(err.to_string()))?
                else {
                    continue;
                };
                added.push(SearchResult {
                    memory: other_memory,
                    score: relationship.confidence,
                    expansion: Some(ExpansionInfo {
                        relationship_type: relationship.relationship_type.clone(),
                        depth: current_depth,
                        via_memory_id: memory_id.clone(),
                    }),
                });
                next_frontier.push(other_id);
            }
        }
        frontier = next_frontier;
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memloom_core::models::ExtractedMemory;
    use memloom_storage::InMemoryStorageClient;
    use serde_json::Value;

    fn memory(id: &str) -> ExtractedMemory {
        ExtractedMemory {
            id: id.to_string(),
            memory_type: "fact".to_string(),
            content: id.to_string(),
            confidence: 0.7,
            workspace_id: "ws".to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    fn relationship(from: &str, to: &str) -> memloom_core::models::ExtractedRelationship {
        memloom_core::models::ExtractedRelationship {
            id: format!("{from}-{to}"),
            from_memory_id: from.to_string(),
            to_memory_id: to.to_string(),
            relationship_type: "knows".to_string(),
            confidence: 0.6,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn expands_one_hop_and_annotates_relationship() {
        let storage = InMemoryStorageClient::new();
        storage.put_with_vector(memory("a"), vec![1.0]);
        storage.put_with_vector(memory("b"), vec![1.0]);
        storage.put_relationship(relationship("a", "b"));

        let seed = vec![SearchResult { memory: memory("a"), score: 0.9, expansion: None }];
        let expanded = expand(&storage, "ws", &seed, 1).await.unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].memory.id, "b");
        let info = expanded[0].expansion.as_ref().unwrap();
        assert_eq!(info.relationship_type, "knows");
        assert_eq!(info.depth, 1);
        assert_eq!(info.via_memory_id, "a");
    }

    #[tokio::test]
    async fn each_memory_is_fetched_at_most_once_across_the_traversal() {
        let storage = InMemoryStorageClient::new();
        storage.put_with_vector(memory("a"), vec![1.0]);
        storage.put_with_vector(memory("b"), vec![1.0]);
        storage.put_with_vector(memory("c"), vec![1.0]);
        // Two paths converge on `c`: a->c directly, and a->b->c.
        storage.put_relationship(relationship("a", "c"));
        storage.put_relationship(relationship("a", "b"));
        storage.put_relationship(relationship("b", "c"));

        let seed = vec![SearchResult { memory: memory("a"), score: 0.9, expansion: None }];
        let expanded = expand(&storage, "ws", &seed, 2).await.unwrap();
        let c_count = expanded.iter().filter(|r| r.memory.id == "c").count();
        assert_eq!(c_count, 1, "c is reachable via two paths but must be fetched once");
    }

    #[tokio::test]
    async fn depth_is_clamped_to_ten() {
        assert_eq!(clamp_depth(0), 1);
        assert_eq!(clamp_depth(50), 10);
        assert_eq!(clamp_depth(5), 5);
    }
}
