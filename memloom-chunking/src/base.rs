use std::collections::HashSet;

use chrono::Utc;

use memloom_core::config::ChunkingConfig;
use memloom_core::models::{Chunk, NormalizedMessage, TokenCountMethod};
use memloom_tokens::TokenCounter;

/// Shared pure-function helpers used by every chunking strategy: message
/// token counting with the configured method, and trailing-overlap message
/// selection. Deliberately a module of free functions plus a thin struct, not
/// a base class — strategies hold one of these rather than inheriting from it
/// (spec §9's design note on polymorphism over strategies).
pub struct ChunkingBase<'a> {
    pub counter: &'a TokenCounter,
    pub method: TokenCountMethod,
}

impl<'a> ChunkingBase<'a> {
    pub fn new(counter: &'a TokenCounter, method: TokenCountMethod) -> Self {
        Self { counter, method }
    }

    pub fn message_tokens(&self, message: &NormalizedMessage) -> usize {
        self.counter.count_message(message, self.method).tokens
    }
}

/// Selects the trailing messages of `messages` whose cumulative token count
/// is `<= budget`, preserving whole messages (never a partial message).
/// Returns the selected messages (in original order) and their total tokens.
/// Used both to build the start of the next chunk and to compute
/// `overlap_with_*` once a chunk boundary is known.
pub fn overlap_tail<'m>(
    messages: &'m [NormalizedMessage],
    base: &ChunkingBase,
    budget: usize,
) -> (Vec<&'m NormalizedMessage>, usize) {
    if budget == 0 || messages.is_empty() {
        return (Vec::new(), 0);
    }
    let mut selected = Vec::new();
    let mut total = 0usize;
    for message in messages.iter().rev() {
        let tokens = base.message_tokens(message);
        if total + tokens > budget && !selected.is_empty() {
            break;
        }
        if total + tokens > budget {
            // Even the single trailing message exceeds budget: still include
            // it alone rather than producing zero overlap for a non-empty
            // budget and a non-empty chunk, matching "whole messages only".
            selected.push(message);
            total += tokens;
            break;
        }
        selected.push(message);
        total += tokens;
    }
    selected.reverse();
    (selected, total)
}


/// Re-exported for callers that only need the config's derived quantities
/// without constructing a `ChunkingBase` (e.g. the orchestrator's validation
/// step).
pub fn validate_config(config: &ChunkingConfig) -> Result<(), String> {
    config.validate()
}

/// Shared greedy boundary-selection (spec §4.3.2, reused verbatim by
/// semantic per §4.3.3): given a set of candidate boundary indices (`i`
/// meaning a split between `messages[i]` and `messages[i+1]`), splits as
/// soon as the accumulated segment reaches a valid size, or at the last
/// passed candidate once the next message would push the segment past max.
/// Returns `None` if some segment exhausts its candidates before finding a
/// valid split, meaning the caller should fall back to sliding-window.
pub fn greedy_split(
    messages: &[NormalizedMessage],
    config: &ChunkingConfig,
    base: &ChunkingBase,
    candidate_set: &HashSet<usize>,
) -> Option<Vec<usize>> {
    if candidate_set.is_empty() {
        return None;
    }
    let min = config.min_chunk_size();
    let max = config.max_tokens_per_chunk;
    let token_at = |idx: usize| base.message_tokens(&messages[idx]);

    let mut splits = Vec::new();
    let mut segment_start = 0usize;
    let mut segment_tokens = 0usize;
    let mut pending_candidate: Option<usize> = None;

    for i in 0..messages.len().saturating_sub(1) {
        segment_tokens += token_at(i);

        if candidate_set.contains(&i) {
            if segment_tokens >= min && segment_tokens <= max {
                splits.push(i);
                segment_start = i + 1;
                segment_tokens = 0;
                pending_candidate = None;
                continue;
            }
            pending_candidate = Some(i);
        }

        let next_tokens = token_at(i + 1);
        if segment_tokens + next_tokens > max {
            match pending_candidate {
                Some(candidate_index) => {
                    splits.push(candidate_index);
                    segment_start = candidate_index + 1;
                    segment_tokens = (segment_start..=i).map(token_at).sum();
                    pending_candidate = None;
                }
                None => return None,
            }
        }
    }
    let _ = segment_start;
    Some(splits)
}

/// Builds final `Chunk`s from a sorted list of split indices (boundary after
/// that message index) for a whole conversation, with overlap computed
/// against the actual overlapping tail exactly as in the sliding-window
/// strategy. `strategy_name` is constant across all produced chunks; callers
/// needing a per-segment fallback annotation build chunks in two passes
/// instead (see `memloom_chunking::semantic`).
pub fn build_chunks_at(
    messages: &[NormalizedMessage],
    splits: &[usize],
    conversation_id: &str,
    config: &ChunkingConfig,
    base: &ChunkingBase,
    strategy_name: &str,
) -> Vec<Chunk> {
    let overlap_budget = config.overlap_budget();
    let mut bounds = Vec::new();
    let mut start = 0usize;
    for &split in splits {
        bounds.push((start, split));
        start = split + 1;
    }
    bounds.push((start, messages.len() - 1));

    let mut chunks = Vec::new();
    for (sequence_minus_one, (seg_start, seg_end)) in bounds.iter().enumerate() {
        let segment = &messages[*seg_start..=*seg_end];
        let token_count: usize = segment.iter().map(|m| base.message_tokens(m)).sum();
        let sequence = sequence_minus_one + 1;

        let (overlap_with_previous, overlap_tokens_with_previous) = if sequence_minus_one == 0 {
            (0, 0)
        } else {
            let (prev_start, prev_end) = bounds[sequence_minus_one - 1];
            let prev_segment = &messages[prev_start..=prev_end];
            let (tail, tail_tokens) = overlap_tail(prev_segment, base, overlap_budget);
            (tail.len(), tail_tokens)
        };

        chunks.push(Chunk {
            id: Chunk::deterministic_id(conversation_id, sequence),
            conversation_id: conversation_id.to_string(),
            sequence,
            total_chunks: bounds.len(),
            messages: segment.to_vec(),
            token_count,
            overlap_with_previous,
            overlap_tokens_with_previous,
            overlap_with_next: 0,
            overlap_tokens_with_next: 0,
            strategy: strategy_name.to_string(),
            created_at: Utc::now(),
            start_index: *seg_start,
            end_index: *seg_end,
        });
    }

    for i in 0..chunks.len().saturating_sub(1) {
        let next_overlap = chunks[i + 1].overlap_with_previous;
        let next_overlap_tokens = chunks[i + 1].overlap_tokens_with_previous;
        chunks[i].overlap_with_next = next_overlap;
        chunks[i].overlap_tokens_with_next = next_overlap_tokens;
    }
    chunks
}
