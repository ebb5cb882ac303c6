use memloom_core::config::ExtractionConfig;
use serde_json::{json, Value};

/// The top-level JSON schema the LLM's structured response must satisfy
/// (spec §4.5): `{memories: [...], relationships: [...]}`, both required.
pub fn build_json_schema(config: &ExtractionConfig) -> Value {
    let metadata_variants: Vec<Value> = config
        .memory_types
        .iter()
        .filter_map(|memory_type| config.per_type.get(memory_type).map(|spec| spec.schema.clone()))
        .collect();

    json!({
        "type": "object",
        "required": ["memories", "relationships"],
        "properties": {
            "memories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type", "content", "confidence"],
                    "properties": {
                        "type": { "enum": config.memory_types },
                        "content": { "type": "string" },
                        "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                        "metadata": { "anyOf": metadata_variants },
                    },
                },
            },
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["from_memory_index", "to_memory_index", "relationship_type", "confidence"],
                    "properties": {
                        "from_memory_index": { "type": "integer", "minimum": 0 },
                        "to_memory_index": { "type": "integer", "minimum": 0 },
                        "relationship_type": { "type": "string" },
                        "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                    },
                },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_memories_and_relationships() {
        let config = ExtractionConfig::default();
        let schema = build_json_schema(&config);
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&Value::String("memories".to_string())));
        assert!(required.contains(&Value::String("relationships".to_string())));
    }

    #[test]
    fn memory_type_enum_matches_configured_types() {
        let config = ExtractionConfig::default();
        let schema = build_json_schema(&config);
        let enum_values = schema["properties"]["memories"]["items"]["properties"]["type"]["enum"].as_array().unwrap();
        assert_eq!(enum_values.len(), config.memory_types.len());
    }
}
