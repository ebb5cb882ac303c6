use memloom_core::config::ExtractionConfig;
use memloom_core::models::{ChunkContext, NormalizedMessage};

/// Builds the prompt sent to the LLM: active memory types with their
/// extraction instructions, an optional prior-context preamble, then the
/// messages as `ROLE: content` lines (spec §4.5).
pub fn build_prompt(config: &ExtractionConfig, messages: &[NormalizedMessage], context: Option<&ChunkContext>) -> String {
    let mut sections = Vec::new();

    let mut instructions = String::from("Extract the following kinds of memories from the conversation below:\n");
    for memory_type in &config.memory_types {
        if let Some(spec) = config.per_type.get(memory_type) {
            instructions.push_str(&format!("- {memory_type}: {}\n", spec.prompt));
        }
    }
    sections.push(instructions);

    if let Some(context) = context {
        let mut preamble = format!("Prior context: {}\n", context.summary);
        if !context.prior_memories.is_empty() {
            preamble.push_str("Already-known memories (do not re-emit):\n");
            for (memory_type, content) in &context.prior_memories {
                preamble.push_str(&format!("- [{memory_type}] {content}\n"));
            }
        }
        sections.push(preamble);
    }

    let mut transcript = String::from("Conversation:\n");
    for message in messages {
        transcript.push_str(&message.as_counted_text());
        transcript.push('\n');
    }
    sections.push(transcript);

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memloom_core::models::Role;
    use serde_json::Value;

    fn message(role: Role, content: &str) -> NormalizedMessage {
        NormalizedMessage {
            id: "m1".to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
            metadata: Value::Null,
        }
    }

    #[test]
    fn enumerates_active_memory_type_instructions() {
        let config = ExtractionConfig::default();
        let prompt = build_prompt(&config, &[message(Role::User, "hi")], None);
        for memory_type in &config.memory_types {
            assert!(prompt.contains(memory_type));
        }
    }

    #[test]
    fn embeds_messages_as_role_content_lines() {
        let config = ExtractionConfig::default();
        let prompt = build_prompt(&config, &[message(Role::User, "hello there")], None);
        assert!(prompt.contains("user: hello there") || prompt.contains("User: hello there"));
    }

    #[test]
    fn inserts_prior_context_preamble_verbatim() {
        let config = ExtractionConfig::default();
        let context = ChunkContext::default_summary(1, 3, 2, vec![("fact".to_string(), "the sky is blue".to_string())]);
        let prompt = build_prompt(&config, &[message(Role::User, "hi")], Some(&context));
        assert!(prompt.contains(&context.summary));
        assert!(prompt.contains("the sky is blue"));
    }

    #[test]
    fn omits_prior_context_section_when_absent() {
        let config = ExtractionConfig::default();
        let prompt = build_prompt(&config, &[message(Role::User, "hi")], None);
        assert!(!prompt.contains("Prior context"));
    }
}
