use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use memloom_core::errors::ParseError;
use memloom_core::models::{NormalizedConversation, NormalizedMessage, Role};

use crate::parser::{ParseOutcome, Parser};
use crate::support::{is_droppable_content, map_role, parse_timestamp, preserve_unknown_fields};

const TOP_LEVEL_KNOWN: &[&str] = &["id", "title", "create_time", "update_time", "mapping", "current_node"];
const NODE_KNOWN: &[&str] = &["id", "message", "parent", "children"];
const MESSAGE_KNOWN: &[&str] = &["id", "author", "role", "content", "parts", "create_time"];

const ROLE_SYNONYMS: &[(&str, Role)] = &[
    ("user", Role::User),
    ("human", Role::User),
    ("assistant", Role::Assistant),
    ("ai", Role::Assistant),
    ("chatbot", Role::Assistant),
    ("system", Role::System),
    ("tool", Role::Assistant),
];

/// Parser for a branching-tree export: a `mapping` of node id → `{message,
/// parent, children}`, the shape used by exports that preserve edit/regen
/// branches rather than a single linear transcript. Linearizes by walking
/// from the root along `current_node`'s ancestry when present, else by
/// following the first child at each branch.
pub struct TreeParser;

impl Parser for TreeParser {
    fn name(&self) -> &str {
        "tree"
    }

    fn can_parse(&self, raw: &Value) -> bool {
        raw.get("mapping").and_then(Value::as_object).is_some()
    }

    fn parse(&self, raw: &Value, _strict: bool) -> Result<ParseOutcome, ParseError> {
        let conversation = parse_tree(raw, 0).map_err(|cause| ParseError::ParseFailed {
            provider: self.name().to_string(),
            index: 0,
            cause,
        })?;
        Ok(ParseOutcome {
            conversations: vec![conversation],
            errors: Vec::new(),
        })
    }
}

fn parse_tree(raw: &Value, index: usize) -> Result<NormalizedConversation, String> {
    let object = raw
        .as_object()
        .ok_or_else(|| format!("conversation at index {index} is not a JSON object"))?;
    let mapping = object
        .get("mapping")
        .and_then(Value::as_object)
        .ok_or_else(|| "missing `mapping` object".to_string())?;

    // Find the root: a node with no `parent`, or whose `parent` is absent
    // from the mapping.
    let root_id = mapping
        .iter()
        .find(|(_, node)| {
            node.as_object()
                .and_then(|n| n.get("parent"))
                .and_then(Value::as_str)
                .map(|parent| !mapping.contains_key(parent))
                .unwrap_or(true)
        })
        .map(|(id, _)| id.clone())
        .ok_or_else(|| "mapping has no root node".to_string())?;

    let current_leaf = object.get("current_node").and_then(Value::as_str);
    let path = linearize(mapping, &root_id, current_leaf);

    let mut messages = Vec::new();
    for node_id in &path {
        let Some(node) = mapping.get(node_id).and_then(Value::as_object) else {
            continue;
        };
        let Some(message) = node.get("message").and_then(Value::as_object) else {
            continue;
        };
        let content = extract_text(message);
        if is_droppable_content(&content) {
            continue;
        }
        let role_str = message
            .get("author")
            .and_then(Value::as_object)
            .and_then(|a| a.get("role"))
            .and_then(Value::as_str)
            .or_else(|| message.get("role").and_then(Value::as_str))
            .unwrap_or("");

        messages.push(NormalizedMessage {
            id: message
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| node_id.clone()),
            role: map_role(role_str, ROLE_SYNONYMS),
            content,
            created_at: parse_timestamp(message.get("create_time")),
            metadata: preserve_unknown_fields(message, MESSAGE_KNOWN),
        });
    }

    let now = Utc::now();
    Ok(NormalizedConversation {
        id: object
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        provider: "tree".to_string(),
        external_id: object.get("id").and_then(Value::as_str).map(str::to_string),
        title: object.get("title").and_then(Value::as_str).map(str::to_string),
        created_at: object
            .get("create_time")
            .map(|v| parse_timestamp(Some(v)))
            .unwrap_or(now),
        updated_at: object
            .get("update_time")
            .map(|v| parse_timestamp(Some(v)))
            .unwrap_or(now),
        messages,
        metadata: preserve_unknown_fields(object, TOP_LEVEL_KNOWN),
    })
}

/// Walks the mapping from `root_id` to a leaf, preferring the ancestry of
/// `current_leaf` when given (picking the child on that path at each branch),
/// else always following the first listed child. Returns node ids root-first.
fn linearize(
    mapping: &serde_json::Map<String, Value>,
    root_id: &str,
    current_leaf: Option<&str>,
) -> Vec<String> {
    let on_path: Option<std::collections::HashSet<&str>> = current_leaf.map(|leaf| {
        let mut set = std::collections::HashSet::new();
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            set.insert(id);
            cursor = mapping
                .get(id)
                .and_then(Value::as_object)
                .and_then(|n| n.get("parent"))
                .and_then(Value::as_str);
        }
        set
    });

    let mut path = Vec::new();
    let mut current = root_id.to_string();
    let mut visited: HashMap<String, ()> = HashMap::new();
    loop {
        if visited.contains_key(&current) {
            break;
        }
        visited.insert(current.clone(), ());
        path.push(current.clone());

        let children: Vec<String> = mapping
            .get(&current)
            .and_then(Value::as_object)
            .and_then(|n| n.get("children"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let next = match &on_path {
            Some(set) => children.iter().find(|child| set.contains(child.as_str())).cloned(),
            None => None,
        }
        .or_else(|| children.first().cloned());

        match next {
            Some(next_id) => current = next_id,
            None => break,
        }
    }
    path
}

fn extract_text(message: &serde_json::Map<String, Value>) -> String {
    if let Some(text) = message.get("content").and_then(Value::as_str) {
        return text.to_string();
    }
    message
        .get("content")
        .and_then(Value::as_object)
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "conv-1",
            "current_node": "n2",
            "mapping": {
                "n1": {"id": "n1", "message": {"id": "m1", "author": {"role": "user"}, "content": "hello", "create_time": 1_700_000_000}, "parent": null, "children": ["n2"]},
                "n2": {"id": "n2", "message": {"id": "m2", "author": {"role": "assistant"}, "content": {"parts": ["hi there"]}}, "parent": "n1", "children": []},
            }
        })
    }

    #[test]
    fn linearizes_mapping_into_ordered_messages() {
        let outcome = TreeParser.parse(&sample(), false).unwrap();
        assert_eq!(outcome.conversations.len(), 1);
        let conv = &outcome.conversations[0];
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
        assert_eq!(conv.messages[1].content, "hi there");
    }

    #[test]
    fn can_parse_requires_mapping_object() {
        assert!(TreeParser.can_parse(&sample()));
        assert!(!TreeParser.can_parse(&json!({"messages": []})));
    }
}
