use std::collections::HashMap;

use memloom_core::models::{ExtractedMemory, ExtractedRelationship};

use crate::ValidationIssue;

/// Per-relationship endpoint/workspace checks (spec §4.7): both endpoints
/// must resolve to memories in the provided set and share a workspace.
pub struct RelationshipValidation {
    pub valid: Vec<ExtractedRelationship>,
    pub invalid: Vec<ExtractedRelationship>,
    pub errors: Vec<ValidationIssue>,
}

pub fn validate_relationships(
    relationships: Vec<ExtractedRelationship>,
    memories_by_id: &HashMap<String, &ExtractedMemory>,
) -> RelationshipValidation {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    let mut errors = Vec::new();

    for relationship in relationships {
        match check_relationship(&relationship, memories_by_id) {
            Ok(()) => valid.push(relationship),
            Err(issue) => {
                errors.push(issue);
                invalid.push(relationship);
            }
        }
    }

    RelationshipValidation { valid, invalid, errors }
}

fn check_relationship(
    relationship: &ExtractedRelationship,
    memories_by_id: &HashMap<String, &ExtractedMemory>,
) -> Result<(), ValidationIssue> {
    let fail = |field: &str, message: String| ValidationIssue {
        record_id: relationship.id.clone(),
        field: field.to_string(),
        message,
    };

    let from = memories_by_id
        .get(&relationship.from_memory_id)
        .ok_or_else(|| fail("from_memory_id", format!("no memory with id {}", relationship.from_memory_id)))?;
    let to = memories_by_id
        .get(&relationship.to_memory_id)
        .ok_or_else(|| fail("to_memory_id", format!("no memory with id {}", relationship.to_memory_id)))?;

    if from.workspace_id != to.workspace_id {
        return Err(fail(
            "workspace_id",
            format!("endpoints belong to different workspaces ({} vs {})", from.workspace_id, to.workspace_id),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn memory(id: &str, workspace_id: &str) -> ExtractedMemory {
        ExtractedMemory {
            id: id.to_string(),
            memory_type: "fact".to_string(),
            content: "content".to_string(),
            confidence: 0.8,
            workspace_id: workspace_id.to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    fn relationship(from: &str, to: &str) -> ExtractedRelationship {
        ExtractedRelationship {
            id: "rel-1".to_string(),
            from_memory_id: from.to_string(),
            to_memory_id: to.to_string(),
            relationship_type: "related_to".to_string(),
            confidence: 0.5,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn accepts_relationship_within_same_workspace() {
        let a = memory("a", "ws1");
        let b = memory("b", "ws1");
        let memories_by_id: HashMap<String, &ExtractedMemory> =
            [(a.id.clone(), &a), (b.id.clone(), &b)].into_iter().collect();
        let report = validate_relationships(vec![relationship("a", "b")], &memories_by_id);
        assert_eq!(report.valid.len(), 1);
    }

    #[test]
    fn rejects_relationship_with_missing_endpoint() {
        let a = memory("a", "ws1");
        let memories_by_id: HashMap<String, &ExtractedMemory> = [(a.id.clone(), &a)].into_iter().collect();
        let report = validate_relationships(vec![relationship("a", "missing")], &memories_by_id);
        assert!(report.valid.is_empty());
        assert_eq!(report.errors[0].field, "to_memory_id");
    }

    #[test]
    fn rejects_relationship_crossing_workspaces() {
        let a = memory("a", "ws1");
        let b = memory("b", "ws2");
        let memories_by_id: HashMap<String, &ExtractedMemory> =
            [(a.id.clone(), &a), (b.id.clone(), &b)].into_iter().collect();
        let report = validate_relationships(vec![relationship("a", "b")], &memories_by_id);
        assert!(report.valid.is_empty());
        assert_eq!(report.errors[0].field, "workspace_id");
    }
}
