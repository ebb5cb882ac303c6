use memloom_core::models::TokenCountMethod;
use memloom_tokens::TokenCounter;

use crate::template::Template;
use crate::types::RankedResult;

/// The output of greedily formatting ranked memories into a budgeted
/// context string.
#[derive(Debug, Clone)]
pub struct FormatResult {
    pub text: String,
    pub included_memory_ids: Vec<String>,
    pub token_count: usize,
    pub truncated: bool,
}

impl FormatResult {
    pub fn budget_used_percent(&self, budget: usize) -> f64 {
        if budget == 0 {
            return 0.0;
        }
        (self.token_count as f64 / budget as f64) * 100.0
    }
}

/// Greedily adds ranked memories, highest rank first, formatting each
/// through `template` and tokenizing the candidate addition (rendered text
/// plus separator) with `counter`/`method`. Stops at the first addition that
/// would exceed `budget` — later, smaller candidates are never tried, so the
/// result set is a strict prefix of the ranked order (spec §4.8).
pub fn format_context(
    template: &Template,
    ranked: &[RankedResult],
    counter: &TokenCounter,
    method: TokenCountMethod,
    budget: usize,
) -> FormatResult {
    let mut text = String::new();
    let mut included_memory_ids = Vec::new();
    let mut tokens_used = 0usize;

    for ranked_result in ranked {
        let rendered = template.render(&ranked_result.result.memory);
        let candidate = if included_memory_ids.is_empty() {
            rendered
        } else {
            format!("{}{}", template.separator, rendered)
        };
        let candidate_tokens = counter.count(&candidate, method).tokens;

        if tokens_used + candidate_tokens > budget {
            break;
        }

        text.push_str(&candidate);
        tokens_used += candidate_tokens;
        included_memory_ids.push(ranked_result.result.memory.id.clone());
    }

    let truncated = included_memory_ids.len() < ranked.len();
    FormatResult { text, included_memory_ids, token_count: tokens_used, truncated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpansionInfo, SearchResult};
    use memloom_core::models::ExtractedMemory;
    use serde_json::Value;

    fn memory(id: &str, content: &str) -> ExtractedMemory {
        ExtractedMemory {
            id: id.to_string(),
            memory_type: "fact".to_string(),
            content: content.to_string(),
            confidence: 0.8,
            workspace_id: "ws".to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now(),
            merged_from: vec![],
        }
    }

    fn ranked(id: &str, content: &str, score: f64) -> RankedResult {
        RankedResult {
            result: SearchResult { memory: memory(id, content), score, expansion: None::<ExpansionInfo> },
            ranking_score: score,
        }
    }

    #[test]
    fn stops_at_first_addition_that_would_exceed_budget() {
        let template = Template { format: "{content}".to_string(), separator: "|".to_string() };
        let counter = TokenCounter::default();
        // char-divide: "a".repeat(n) costs ceil(n/4) tokens.
        let ranked_list = vec![
            ranked("m1", &"a".repeat(2000), 0.9), // 500 tokens
            ranked("m2", &"b".repeat(3200), 0.8), // 800 tokens
            ranked("m3", &"c".repeat(3600), 0.7), // 900 tokens
        ];
        let result = format_context(&template, &ranked_list, &counter, TokenCountMethod::CharDivide, 2000);
        assert_eq!(result.included_memory_ids, vec!["m1", "m2"]);
        assert!(result.truncated);
        assert!(result.token_count <= 2000);
    }

    #[test]
    fn not_truncated_when_everything_fits() {
        let template = Template { format: "{content}".to_string(), separator: "|".to_string() };
        let counter = TokenCounter::default();
        let ranked_list = vec![ranked("m1", "short", 0.9)];
        let result = format_context(&template, &ranked_list, &counter, TokenCountMethod::CharDivide, 100);
        assert!(!result.truncated);
        assert_eq!(result.included_memory_ids, vec!["m1"]);
    }

    #[test]
    fn empty_ranked_list_yields_empty_untruncated_result() {
        let template = Template { format: "{content}".to_string(), separator: "|".to_string() };
        let counter = TokenCounter::default();
        let result = format_context(&template, &[], &counter, TokenCountMethod::CharDivide, 100);
        assert!(!result.truncated);
        assert_eq!(result.token_count, 0);
    }
}
