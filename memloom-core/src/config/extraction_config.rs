use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prompt and response sub-schema for one memory type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTypeSpec {
    pub prompt: String,
    /// A JSON-schema fragment for this type's `metadata`/`content` shape.
    pub schema: serde_json::Value,
}

/// Model invocation parameters passed through to the `LlmProvider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Configuration for the extraction strategy: which memory types to pull out
/// of each chunk, their prompts/schemas, and the model to call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub memory_types: Vec<String>,
    pub per_type: HashMap<String, MemoryTypeSpec>,
    pub model_params: ModelParams,
    pub timeout_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let mut per_type = HashMap::new();
        per_type.insert(
            "entity".to_string(),
            MemoryTypeSpec {
                prompt: "Extract named entities (people, places, organizations, tools) mentioned in the conversation.".to_string(),
                schema: serde_json::json!({"entity_type": "string", "entity_name": "string"}),
            },
        );
        per_type.insert(
            "fact".to_string(),
            MemoryTypeSpec {
                prompt: "Extract standalone facts the participants established as true.".to_string(),
                schema: serde_json::json!({}),
            },
        );
        per_type.insert(
            "decision".to_string(),
            MemoryTypeSpec {
                prompt: "Extract decisions the participants made or committed to.".to_string(),
                schema: serde_json::json!({}),
            },
        );
        Self {
            memory_types: vec!["entity".to_string(), "fact".to_string(), "decision".to_string()],
            per_type,
            model_params: ModelParams::default(),
            timeout_ms: 30_000,
        }
    }
}
