use std::collections::{HashMap, HashSet};

use memloom_core::models::ExtractedRelationship;

/// Rewrites relationship endpoints through the `oldId -> survivingId` map
/// produced by `merge_duplicates`, drops relationships whose endpoints no
/// longer exist in the final memory set, and collapses duplicate
/// `(from, to, type)` tuples keeping the highest-confidence instance
/// (spec §4.6, relationship rewiring after deduplication).
pub fn rewire_relationships(
    relationships: Vec<ExtractedRelationship>,
    id_map: &HashMap<String, String>,
    surviving_memory_ids: &HashSet<String>,
) -> Vec<ExtractedRelationship> {
    let mut by_key: HashMap<(String, String, String), ExtractedRelationship> = HashMap::new();

    for mut relationship in relationships {
        relationship.from_memory_id = resolve(&relationship.from_memory_id, id_map);
        relationship.to_memory_id = resolve(&relationship.to_memory_id, id_map);

        if !surviving_memory_ids.contains(&relationship.from_memory_id)
            || !surviving_memory_ids.contains(&relationship.to_memory_id)
        {
            continue;
        }

        let key = relationship.dedup_key();
        match by_key.get(&key) {
            Some(existing) if existing.confidence >= relationship.confidence => {}
            _ => {
                by_key.insert(key, relationship);
            }
        }
    }

    let mut rewired: Vec<ExtractedRelationship> = by_key.into_values().collect();
    rewired.sort_by(|a, b| a.id.cmp(&b.id));
    rewired
}

fn resolve(id: &str, id_map: &HashMap<String, String>) -> String {
    id_map.get(id).cloned().unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge_duplicates;
    use memloom_core::models::ExtractedMemory;
    use memloom_test_fixtures::{load_json, names};
    use serde_json::from_value;

    #[test]
    fn duplicate_relationships_collapse_and_orphans_drop() {
        let fixture = load_json(names::DEDUP_RELATIONSHIP_REWIRE);
        let memories: Vec<ExtractedMemory> = from_value(fixture["memories"].clone()).expect("fixture memories");
        let relationships: Vec<ExtractedRelationship> =
            from_value(fixture["relationships"].clone()).expect("fixture relationships");

        let outcome = merge_duplicates(memories);
        let surviving_ids: HashSet<String> = outcome.memories.iter().map(|m| m.id.clone()).collect();
        let rewired = rewire_relationships(relationships, &outcome.id_map, &surviving_ids);

        assert_eq!(rewired.len(), 1, "the two knows edges collapse and the orphaned mentions edge drops");
        let knows = &rewired[0];
        assert_eq!(knows.relationship_type, "knows");
        assert_eq!(knows.confidence, 0.9, "higher-confidence duplicate survives");
        assert_eq!(knows.from_memory_id, "id-12");
        assert_eq!(knows.to_memory_id, "id-34");
    }

    #[test]
    fn relationship_with_unknown_endpoint_is_dropped() {
        let now = chrono::Utc::now();
        let relationships = vec![ExtractedRelationship {
            id: "r1".to_string(),
            from_memory_id: "a".to_string(),
            to_memory_id: "missing".to_string(),
            relationship_type: "related_to".to_string(),
            confidence: 0.5,
            created_at: now,
        }];
        let surviving: HashSet<String> = ["a".to_string()].into_iter().collect();
        let rewired = rewire_relationships(relationships, &HashMap::new(), &surviving);
        assert!(rewired.is_empty());
    }
}
