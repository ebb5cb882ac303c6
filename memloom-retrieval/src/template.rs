use std::collections::HashMap;
use std::sync::RwLock;

use memloom_core::errors::RetrievalError;
use memloom_core::models::ExtractedMemory;

/// Names that ship built-in and can never be overwritten (spec §4.8).
const DEFAULT_TEMPLATE_NAMES: &[&str] = &["chat", "detailed", "summary"];

/// A named pair of per-memory format string and separator used to render
/// memories for LLM prompts. Variables: `{type}`, `{content}`,
/// `{confidence}`, `{created_at}`, and `{metadata.<key>}` projections.
#[derive(Debug, Clone)]
pub struct Template {
    pub format: String,
    pub separator: String,
}

impl Template {
    pub fn render(&self, memory: &ExtractedMemory) -> String {
        render_format(&self.format, memory)
    }
}

fn render_format(format: &str, memory: &ExtractedMemory) -> String {
    let mut out = String::with_capacity(format.len());
    let bytes = format.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = format[i..].find('}') {
                let variable = &format[i + 1..i + end];
                out.push_str(&resolve_variable(variable, memory));
                i += end + 1;
                continue;
            }
        }
        let ch = format[i..].chars().next().expect("i is a valid char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn resolve_variable(variable: &str, memory: &ExtractedMemory) -> String {
    match variable {
        "type" => memory.memory_type.clone(),
        "content" => memory.content.clone(),
        "confidence" => format!("{:.2}", memory.confidence),
        "created_at" => memory.created_at.to_rfc3339(),
        other => {
            if let Some(key) = other.strip_prefix("metadata.") {
                memory
                    .metadata
                    .get(key)
                    .map(|value| match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default()
            } else {
                String::new()
            }
        }
    }
}

/// Populated at construction with the three built-ins; read-only afterwards
/// except for explicit `register` calls for custom names. Registering under
/// a default name is a hard error rather than a silent replace — spec §4.8:
/// "cannot be overwritten".
pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, Template>>,
}

impl TemplateRegistry {
    pub fn with_builtins() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            "chat".to_string(),
            Template { format: "{content}".to_string(), separator: "\n".to_string() },
        );
        templates.insert(
            "detailed".to_string(),
            Template {
                format: "[{type}] {content} (confidence: {confidence}, {created_at})".to_string(),
                separator: "\n\n".to_string(),
            },
        );
        templates.insert(
            "summary".to_string(),
            Template { format: "- {content}".to_string(), separator: "\n".to_string() },
        );
        Self { templates: RwLock::new(templates) }
    }

    pub fn register(&self, name: &str, template: Template) -> Result<(), RetrievalError> {
        if DEFAULT_TEMPLATE_NAMES.contains(&name) {
            return Err(RetrievalError::DefaultOverwrite { kind: "template", name: name.to_string() });
        }
        self.templates.write().expect("template registry lock poisoned").insert(name.to_string(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Template, RetrievalError> {
        self.templates
            .read()
            .expect("template registry lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RetrievalError::TemplateNotFound(name.to_string()))
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory() -> ExtractedMemory {
        ExtractedMemory {
            id: "id-1".to_string(),
            memory_type: "fact".to_string(),
            content: "the sky is blue".to_string(),
            confidence: 0.876,
            workspace_id: "ws".to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: json!({"source": "user"}),
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    #[test]
    fn chat_template_renders_bare_content() {
        let registry = TemplateRegistry::with_builtins();
        let template = registry.get("chat").unwrap();
        assert_eq!(template.render(&memory()), "the sky is blue");
    }

    #[test]
    fn detailed_template_substitutes_all_known_variables() {
        let registry = TemplateRegistry::with_builtins();
        let template = registry.get("detailed").unwrap();
        let rendered = template.render(&memory());
        assert!(rendered.contains("[fact]"));
        assert!(rendered.contains("the sky is blue"));
        assert!(rendered.contains("0.88"));
    }

    #[test]
    fn metadata_projection_resolves_nested_key() {
        let template = Template { format: "{content} ({metadata.source})".to_string(), separator: "\n".to_string() };
        assert_eq!(template.render(&memory()), "the sky is blue (user)");
    }

    #[test]
    fn missing_metadata_key_resolves_empty() {
        let template = Template { format: "{metadata.missing}x".to_string(), separator: "\n".to_string() };
        assert_eq!(template.render(&memory()), "x");
    }

    #[test]
    fn default_template_names_cannot_be_overwritten() {
        let registry = TemplateRegistry::with_builtins();
        let err = registry
            .register("chat", Template { format: "{content}".to_string(), separator: "\n".to_string() })
            .unwrap_err();
        assert!(matches!(err, RetrievalError::DefaultOverwrite { .. }));
    }

    #[test]
    fn custom_template_can_be_registered_and_fetched() {
        let registry = TemplateRegistry::with_builtins();
        registry
            .register("terse", Template { format: "{content}".to_string(), separator: " ".to_string() })
            .unwrap();
        assert!(registry.get("terse").is_ok());
    }

    #[test]
    fn unknown_template_name_is_an_error() {
        let registry = TemplateRegistry::with_builtins();
        assert!(matches!(registry.get("nope"), Err(RetrievalError::TemplateNotFound(_))));
    }
}
