use std::collections::HashSet;

use memloom_core::config::ChunkingConfig;
use memloom_core::errors::ChunkingError;
use memloom_core::models::{Chunk, NormalizedConversation, NormalizedMessage, Role};
use memloom_tokens::TokenCounter;

use crate::base::{build_chunks_at, greedy_split, ChunkingBase};
use crate::sliding_window::{can_handle_whole_messages, slide};
use crate::strategy::ChunkingStrategy;

const FIVE_MINUTES_SECS: i64 = 5 * 60;
const ONE_MINUTE_SECS: i64 = 60;

pub struct BoundaryStrategy;

impl ChunkingStrategy for BoundaryStrategy {
    fn name(&self) -> &str {
        "boundary"
    }

    fn can_handle(
        &self,
        conversation: &NormalizedConversation,
        config: &ChunkingConfig,
        counter: &TokenCounter,
    ) -> Result<(), String> {
        can_handle_whole_messages(&conversation.messages, config, counter)
    }

    fn chunk(
        &self,
        conversation: &NormalizedConversation,
        config: &ChunkingConfig,
        counter: &TokenCounter,
    ) -> Result<Vec<Chunk>, ChunkingError> {
        let base = ChunkingBase::new(counter, config.token_count_method);
        let candidate_set: HashSet<usize> = candidates(&conversation.messages).into_iter().collect();
        match greedy_split(&conversation.messages, config, &base, &candidate_set) {
            Some(splits) => Ok(build_chunks_at(&conversation.messages, &splits, &conversation.id, config, &base, self.name())),
            None => Ok(slide(&conversation.messages, &conversation.id, config, counter, 0, "sliding-window")),
        }
    }
}

/// Scores the boundary between `messages[i]` and `messages[i+1]`. Positive
/// scores are candidates; position near either end of the conversation
/// halves the score (spec §4.3.2).
fn score_boundary(messages: &[NormalizedMessage], i: usize) -> f64 {
    let mut score = 0.0;
    let following = &messages[i + 1];
    if following.role == Role::User {
        score += 50.0;
    }
    let gap = (following.created_at - messages[i].created_at).num_seconds();
    if gap > FIVE_MINUTES_SECS {
        score += 30.0;
    } else if gap > ONE_MINUTE_SECS {
        score += 15.0;
    }

    let len = messages.len();
    let near_threshold = ((len as f64 * 0.1).floor() as usize).min(3);
    let near_start = i < near_threshold;
    let near_end = i + 1 > len.saturating_sub(near_threshold);
    if near_start || near_end {
        score /= 2.0;
    }
    score
}

/// Computes every candidate boundary index (`i` meaning a split between
/// `messages[i]` and `messages[i+1]`) with score > 0.
fn candidates(messages: &[NormalizedMessage]) -> Vec<usize> {
    if messages.len() < 2 {
        return Vec::new();
    }
    (0..messages.len() - 1)
        .filter(|&i| score_boundary(messages, i) > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use memloom_core::models::TokenCountMethod;
    use serde_json::Value;
    use uuid::Uuid;

    fn msg(role: Role, content: &str, at: chrono::DateTime<Utc>) -> NormalizedMessage {
        NormalizedMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            created_at: at,
            metadata: Value::Null,
        }
    }

    #[test]
    fn scenario_2_splits_at_user_message_after_large_gap() {
        let t0 = Utc::now();
        let roles = [Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User];
        let mut messages = Vec::new();
        let mut t = t0;
        for (i, role) in roles.iter().enumerate() {
            if i == 3 {
                // 10-minute gap lands right before message index 3 (0-based),
                // i.e. the boundary between message 2 and message 3 (the 4th
                // message, 1-based).
                t += Duration::minutes(10);
            } else {
                t += Duration::seconds(5);
            }
            messages.push(msg(*role, &"m".repeat(40), t));
        }

        let counter = TokenCounter::default();
        let mut cfg = ChunkingConfig::default();
        cfg.token_count_method = TokenCountMethod::CharDivide;
        cfg.max_tokens_per_chunk = 1000;
        cfg.overlap_tokens = Some(0);
        cfg.min_chunk_size = Some(25);
        let base = ChunkingBase::new(&counter, cfg.token_count_method);

        let candidate_set: HashSet<usize> = candidates(&messages).into_iter().collect();
        let splits = greedy_split(&messages, &cfg, &base, &candidate_set);
        assert!(splits.is_some());
        let splits = splits.unwrap();
        // Split should occur at boundary index 2 (between message 2 and 3,
        // 0-based), i.e. message 4 (1-based) starts the new chunk.
        assert!(splits.contains(&2), "expected split at boundary index 2, got {splits:?}");
    }

    #[test]
    fn falls_back_to_sliding_window_when_no_boundary_exists() {
        let t0 = Utc::now();
        let messages: Vec<NormalizedMessage> = (0..6)
            .map(|i| msg(Role::Assistant, &"x".repeat(40), t0 + Duration::seconds(i as i64)))
            .collect();
        let counter = TokenCounter::default();
        let mut cfg = ChunkingConfig::default();
        cfg.token_count_method = TokenCountMethod::CharDivide;
        cfg.max_tokens_per_chunk = 20;
        cfg.overlap_tokens = Some(2);
        cfg.min_chunk_size = Some(1);

        let conversation = NormalizedConversation {
            id: "conv-fallback".to_string(),
            provider: "test".to_string(),
            external_id: None,
            title: None,
            created_at: t0,
            updated_at: t0,
            messages,
            metadata: Value::Null,
        };
        let chunks = BoundaryStrategy.chunk(&conversation, &cfg, &counter).unwrap();
        assert!(chunks.iter().all(|c| c.strategy == "sliding-window"));
    }
}
