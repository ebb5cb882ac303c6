use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use memloom_core::config::ExtractionConfig;
use memloom_core::errors::ExtractionError;
use memloom_core::models::{content_hash_id, ChunkContext, ExtractedMemory, ExtractedRelationship, NormalizedMessage};
use memloom_core::traits::LlmProvider;

use crate::prompt::build_prompt;
use crate::schema::build_json_schema;

/// Given a chunk's messages plus optional previous-chunk context, produces
/// `{memories, relationships}` via the configured LLM (spec §4.5).
pub struct ExtractionStrategy<'a> {
    llm: &'a dyn LlmProvider,
    config: &'a ExtractionConfig,
}

impl<'a> ExtractionStrategy<'a> {
    pub fn new(llm: &'a dyn LlmProvider, config: &'a ExtractionConfig) -> Self {
        Self { llm, config }
    }

    pub async fn extract(
        &self,
        messages: &[NormalizedMessage],
        workspace_id: &str,
        conversation_id: &str,
        context_id: &str,
        context: Option<&ChunkContext>,
    ) -> Result<(Vec<ExtractedMemory>, Vec<ExtractedRelationship>), ExtractionError> {
        let prompt = build_prompt(self.config, messages, context);
        let schema = build_json_schema(self.config);

        let call = self.llm.complete_structured(&prompt, &schema, &self.config.model_params);
        let response = match tokio::time::timeout(Duration::from_millis(self.config.timeout_ms), call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExtractionError::Timeout {
                    context_id: context_id.to_string(),
                    elapsed_ms: self.config.timeout_ms,
                })
            }
        };

        map_response(response, self.config, workspace_id, conversation_id, messages)
    }
}

fn map_response(
    response: Value,
    config: &ExtractionConfig,
    workspace_id: &str,
    conversation_id: &str,
    messages: &[NormalizedMessage],
) -> Result<(Vec<ExtractedMemory>, Vec<ExtractedRelationship>), ExtractionError> {
    let memories_raw = response
        .get("memories")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::SchemaMismatch("response missing required \"memories\" array".to_string()))?;
    let relationships_raw = response
        .get("relationships")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::SchemaMismatch("response missing required \"relationships\" array".to_string()))?;

    let source_message_ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
    let now = Utc::now();

    let mut memories = Vec::with_capacity(memories_raw.len());
    for item in memories_raw {
        memories.push(map_memory_item(item, config, workspace_id, conversation_id, &source_message_ids, now)?);
    }

    let mut relationships = Vec::with_capacity(relationships_raw.len());
    for item in relationships_raw {
        let relationship = map_relationship_item(item, &memories, now)?;
        match relationship {
            Some(r) => relationships.push(r),
            None => continue,
        }
    }

    Ok((memories, relationships))
}

fn map_memory_item(
    item: &Value,
    config: &ExtractionConfig,
    workspace_id: &str,
    conversation_id: &str,
    source_message_ids: &[String],
    now: chrono::DateTime<Utc>,
) -> Result<ExtractedMemory, ExtractionError> {
    let memory_type = item
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractionError::SchemaMismatch("memory item missing \"type\"".to_string()))?;
    if !config.memory_types.iter().any(|t| t == memory_type) {
        return Err(ExtractionError::SchemaMismatch(format!("memory type \"{memory_type}\" is not configured")));
    }
    let content = item
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractionError::SchemaMismatch("memory item missing \"content\"".to_string()))?;
    let confidence = item
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| ExtractionError::SchemaMismatch("memory item missing \"confidence\"".to_string()))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ExtractionError::SchemaMismatch(format!("memory confidence {confidence} out of [0,1]")));
    }
    let metadata = item.get("metadata").cloned().unwrap_or(Value::Null);

    let id = content_hash_id(memory_type, content, workspace_id, &metadata);
    Ok(ExtractedMemory {
        id,
        memory_type: memory_type.to_string(),
        content: content.to_string(),
        confidence,
        workspace_id: workspace_id.to_string(),
        conversation_id: conversation_id.to_string(),
        source_message_ids: source_message_ids.to_vec(),
        source_chunk_ids: Vec::new(),
        metadata,
        created_at: now,
        merged_from: Vec::new(),
    })
}

/// Resolves a relationship item's index pair into memory ids. Returns `Ok(None)`
/// when the indices are out of range — silently discarded per spec §4.5, not
/// a schema error, since the indices themselves are structurally valid.
fn map_relationship_item(
    item: &Value,
    memories: &[ExtractedMemory],
    now: chrono::DateTime<Utc>,
) -> Result<Option<ExtractedRelationship>, ExtractionError> {
    let from_index = item
        .get("from_memory_index")
        .and_then(Value::as_u64)
        .ok_or_else(|| ExtractionError::SchemaMismatch("relationship item missing \"from_memory_index\"".to_string()))?
        as usize;
    let to_index = item
        .get("to_memory_index")
        .and_then(Value::as_u64)
        .ok_or_else(|| ExtractionError::SchemaMismatch("relationship item missing \"to_memory_index\"".to_string()))?
        as usize;
    let relationship_type = item
        .get("relationship_type")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractionError::SchemaMismatch("relationship item missing \"relationship_type\"".to_string()))?;
    let confidence = item
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| ExtractionError::SchemaMismatch("relationship item missing \"confidence\"".to_string()))?;

    let (Some(from), Some(to)) = (memories.get(from_index), memories.get(to_index)) else {
        warn!(from_index, to_index, "relationship index out of range, discarding");
        return Ok(None);
    };

    Ok(Some(ExtractedRelationship {
        id: uuid::Uuid::new_v4().to_string(),
        from_memory_id: from.id.clone(),
        to_memory_id: to.id.clone(),
        relationship_type: relationship_type.to_string(),
        confidence,
        created_at: now,
    }))
}
