use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use memloom_core::errors::ParseError;
use memloom_core::models::{NormalizedConversation, NormalizedMessage, Role};

use crate::parser::{ParseOutcome, Parser};
use crate::support::{is_droppable_content, map_role, parse_timestamp, preserve_unknown_fields};

const TOP_LEVEL_KNOWN: &[&str] = &["id", "title", "create_time", "update_time", "messages"];
const MESSAGE_KNOWN: &[&str] = &["id", "role", "author", "content", "text", "create_time", "timestamp"];

const ROLE_SYNONYMS: &[(&str, Role)] = &[
    ("user", Role::User),
    ("human", Role::User),
    ("assistant", Role::Assistant),
    ("ai", Role::Assistant),
    ("bot", Role::Assistant),
    ("model", Role::Assistant),
    ("system", Role::System),
];

/// Parser for a single-conversation-per-file export: a flat top-level
/// `messages` array.
pub struct SimpleParser;

impl Parser for SimpleParser {
    fn name(&self) -> &str {
        "simple"
    }

    fn can_parse(&self, raw: &Value) -> bool {
        raw.get("messages").and_then(Value::as_array).is_some()
    }

    fn parse(&self, raw: &Value, _strict: bool) -> Result<ParseOutcome, ParseError> {
        let conversation = parse_one(raw, 0)
            .map_err(|cause| ParseError::ParseFailed {
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

/// Parses a single `{messages: [...], ...}` object into a conversation.
/// Shared by `SimpleParser` and `BundleParser` (each bundle element has this
/// same shape).
pub fn parse_one(raw: &Value, index: usize) -> Result<NormalizedConversation, String> {
    let object = raw
        .as_object()
        .ok_or_else(|| format!("conversation at index {index} is not a JSON object"))?;

    let messages_raw = object
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing `messages` array".to_string())?;

    let mut messages = Vec::new();
    for (message_index, message_value) in messages_raw.iter().enumerate() {
        let Some(message_object) = message_value.as_object() else {
            continue;
        };
        let content = message_object
            .get("content")
            .and_then(Value::as_str)
            .or_else(|| message_object.get("text").and_then(Value::as_str))
            .unwrap_or("");
        if is_droppable_content(content) {
            continue;
        }
        let role_str = message_object
            .get("role")
            .and_then(Value::as_str)
            .or_else(|| message_object.get("author").and_then(Value::as_str))
            .unwrap_or("");

        messages.push(NormalizedMessage {
            id: message_object
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}-{message_index}", Uuid::new_v4())),
            role: map_role(role_str, ROLE_SYNONYMS),
            content: content.to_string(),
            created_at: parse_timestamp(
                message_object
                    .get("create_time")
                    .or_else(|| message_object.get("timestamp")),
            ),
            metadata: preserve_unknown_fields(message_object, MESSAGE_KNOWN),
        });
    }

    let now = Utc::now();
    Ok(NormalizedConversation {
        id: object
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        provider: "simple".to_string(),
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
