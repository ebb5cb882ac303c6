use memloom_core::config::ValidatorConfig;
use memloom_core::models::ExtractedMemory;

use crate::ValidationIssue;

/// Per-memory field/range checks (spec §4.7). Never rejects the batch; bad
/// records are routed to `invalid` with an explanatory issue instead.
pub struct MemoryValidation {
    pub valid: Vec<ExtractedMemory>,
    pub invalid: Vec<ExtractedMemory>,
    pub errors: Vec<ValidationIssue>,
}

pub fn validate_memories(memories: Vec<ExtractedMemory>, config: &ValidatorConfig) -> MemoryValidation {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    let mut errors = Vec::new();

    for memory in memories {
        match check_memory(&memory, config) {
            Ok(()) => valid.push(memory),
            Err(issue) => {
                errors.push(issue);
                invalid.push(memory);
            }
        }
    }

    MemoryValidation { valid, invalid, errors }
}

fn check_memory(memory: &ExtractedMemory, config: &ValidatorConfig) -> Result<(), ValidationIssue> {
    let fail = |field: &str, message: String| ValidationIssue {
        record_id: memory.id.clone(),
        field: field.to_string(),
        message,
    };

    if memory.memory_type.trim().is_empty() {
        return Err(fail("memory_type", "memory type must not be empty".to_string()));
    }
    if memory.workspace_id.trim().is_empty() {
        return Err(fail("workspace_id", "workspace id must not be empty".to_string()));
    }
    if memory.conversation_id.trim().is_empty() {
        return Err(fail("conversation_id", "conversation id must not be empty".to_string()));
    }
    if memory.content.trim().chars().count() < config.min_content_length {
        return Err(fail(
            "content",
            format!("content is shorter than the minimum of {} characters", config.min_content_length),
        ));
    }
    if !(0.0..=1.0).contains(&memory.confidence) {
        return Err(fail("confidence", format!("confidence {} is outside [0, 1]", memory.confidence)));
    }
    if let Some(min_confidence) = config.min_confidence {
        if memory.confidence < min_confidence {
            return Err(fail(
                "confidence",
                format!("confidence {} is below the configured minimum of {min_confidence}", memory.confidence),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn memory(content: &str, confidence: f64) -> ExtractedMemory {
        ExtractedMemory {
            id: "id-1".to_string(),
            memory_type: "fact".to_string(),
            content: content.to_string(),
            confidence,
            workspace_id: "ws".to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    #[test]
    fn accepts_well_formed_memory() {
        let config = ValidatorConfig::default();
        let report = validate_memories(vec![memory("a valid fact", 0.8)], &config);
        assert_eq!(report.valid.len(), 1);
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn rejects_short_content() {
        let config = ValidatorConfig::default();
        let report = validate_memories(vec![memory("ab", 0.8)], &config);
        assert!(report.valid.is_empty());
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.errors[0].field, "content");
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let config = ValidatorConfig::default();
        let report = validate_memories(vec![memory("a valid fact", 1.5)], &config);
        assert_eq!(report.errors[0].field, "confidence");
    }

    #[test]
    fn applies_configured_minimum_confidence() {
        let config = ValidatorConfig {
            min_confidence: Some(0.5),
            min_content_length: 3,
        };
        let report = validate_memories(vec![memory("a valid fact", 0.4)], &config);
        assert!(report.valid.is_empty());
        assert_eq!(report.invalid.len(), 1);
    }

    #[test]
    fn trims_whitespace_before_measuring_content_length() {
        let config = ValidatorConfig::default();
        let report = validate_memories(vec![memory("   ab   ", 0.8)], &config);
        assert!(report.valid.is_empty(), "trimmed content is only 2 characters");
    }
}
