use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use memloom_core::models::ExtractedMemory;

/// Result of `merge_duplicates`: the deduplicated memory set plus the
/// `oldId -> survivingId` map built from each survivor's `merged_from`,
/// ready for `rewire_relationships`.
pub struct MergeOutcome {
    pub memories: Vec<ExtractedMemory>,
    pub id_map: HashMap<String, String>,
}

/// Groups memories by content-hash id (identity, spec §4.6), picks the
/// highest-confidence instance per group as survivor, and folds the rest in:
/// confidence = max, source ids = sorted union, metadata filled in from
/// lower-confidence instances in descending-confidence order.
pub fn merge_duplicates(memories: Vec<ExtractedMemory>) -> MergeOutcome {
    let mut groups: HashMap<String, Vec<ExtractedMemory>> = HashMap::new();
    for memory in memories {
        groups.entry(memory.id.clone()).or_default().push(memory);
    }

    let mut merged = Vec::with_capacity(groups.len());
    let mut id_map = HashMap::new();

    for (_, mut group) in groups {
        group.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        let mut survivor = group[0].clone();
        let absorbed = &group[1..];

        let mut message_ids: BTreeSet<String> = survivor.source_message_ids.iter().cloned().collect();
        let mut chunk_ids: BTreeSet<String> = survivor.source_chunk_ids.iter().cloned().collect();
        for other in absorbed {
            message_ids.extend(other.source_message_ids.iter().cloned());
            chunk_ids.extend(other.source_chunk_ids.iter().cloned());
        }
        survivor.source_message_ids = message_ids.into_iter().collect();
        survivor.source_chunk_ids = chunk_ids.into_iter().collect();

        let merged_from: Vec<String> = absorbed.iter().map(|m| m.id.clone()).collect();
        for old_id in &merged_from {
            id_map.insert(old_id.clone(), survivor.id.clone());
        }
        survivor.merged_from = merged_from;

        survivor.confidence = group[0].confidence;
        survivor.created_at = group.iter().map(|m| m.created_at).min().expect("group is non-empty");

        if !matches!(survivor.metadata, Value::Object(_)) {
            survivor.metadata = Value::Object(Map::new());
        }
        if let Value::Object(survivor_map) = &mut survivor.metadata {
            for other in absorbed {
                if let Value::Object(other_map) = &other.metadata {
                    for (key, value) in other_map {
                        survivor_map.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        merged.push(survivor);
    }

    merged.sort_by(|a, b| a.id.cmp(&b.id));
    MergeOutcome { memories: merged, id_map }
}
