use serde_json::Value;

use memloom_core::errors::ParseError;

use crate::parser::{ParseErrorRecord, ParseOutcome, Parser};
use crate::parsers::simple::parse_one;

/// Parser for a multi-conversation export: a top-level `{conversations: [...]}`
/// array, each element shaped like a `SimpleParser` conversation.
pub struct BundleParser;

impl Parser for BundleParser {
    fn name(&self) -> &str {
        "bundle"
    }

    fn can_parse(&self, raw: &Value) -> bool {
        raw.get("conversations").and_then(Value::as_array).is_some()
    }

    fn parse(&self, raw: &Value, strict: bool) -> Result<ParseOutcome, ParseError> {
        let items = raw
            .get("conversations")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::ParseFailed {
                provider: self.name().to_string(),
                index: 0,
                cause: "missing `conversations` array".to_string(),
            })?;

        let mut conversations = Vec::new();
        let mut errors = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match parse_one(item, index) {
                Ok(conversation) => conversations.push(conversation),
                Err(cause) => {
                    if strict {
                        return Err(ParseError::ParseFailed {
                            provider: self.name().to_string(),
                            index,
                            cause,
                        });
                    }
                    errors.push(ParseErrorRecord { index, message: cause });
                }
            }
        }
        Ok(ParseOutcome { conversations, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_conversations_in_bundle() {
        let raw = json!({
            "conversations": [
                {"id": "a", "messages": [{"role": "user", "content": "hi"}]},
                {"id": "b", "messages": [{"role": "assistant", "content": "hello"}]},
            ]
        });
        let outcome = BundleParser.parse(&raw, false).unwrap();
        assert_eq!(outcome.conversations.len(), 2);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn non_strict_mode_collects_per_conversation_errors() {
        let raw = json!({
            "conversations": [
                {"id": "a", "messages": [{"role": "user", "content": "hi"}]},
                {"id": "b"},
            ]
        });
        let outcome = BundleParser.parse(&raw, false).unwrap();
        assert_eq!(outcome.conversations.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 1);
    }

    #[test]
    fn strict_mode_aborts_on_first_failure() {
        let raw = json!({
            "conversations": [
                {"id": "a"},
                {"id": "b", "messages": [{"role": "user", "content": "hi"}]},
            ]
        });
        let result = BundleParser.parse(&raw, true);
        assert!(result.is_err());
    }
}
