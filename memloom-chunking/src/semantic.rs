use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use memloom_core::config::ChunkingConfig;
use memloom_core::errors::ChunkingError;
use memloom_core::models::{Chunk, NormalizedConversation, NormalizedMessage};
use memloom_tokens::TokenCounter;
use serde_json::Value;

use crate::base::{build_chunks_at, greedy_split, ChunkingBase};
use crate::sliding_window::{can_handle_whole_messages, slide};
use crate::strategy::ChunkingStrategy;

const WINDOW: usize = 3;
const BYPASS_BELOW_MESSAGES: usize = 5;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "that",
    "this", "with", "have", "from", "they", "will", "would", "there", "their", "what", "about",
    "which", "when", "make", "like", "time", "just", "into", "over", "also", "than", "then",
    "them", "these", "some", "could", "were", "been", "being", "your", "yours",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]+").expect("static word-splitting regex"))
}

pub struct SemanticStrategy;

impl ChunkingStrategy for SemanticStrategy {
    fn name(&self) -> &str {
        "semantic"
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
        let messages = &conversation.messages;
        if messages.len() < BYPASS_BELOW_MESSAGES {
            return Ok(slide(messages, &conversation.id, config, counter, 0, "sliding-window"));
        }

        let base = ChunkingBase::new(counter, config.token_count_method);
        let keyword_freqs: Vec<HashMap<String, usize>> = messages.iter().map(extract_keywords).collect();
        let candidate_set: HashSet<usize> = semantic_candidates(&keyword_freqs, config.semantic_moderate_threshold);

        let chunks = match greedy_split(messages, config, &base, &candidate_set) {
            Some(splits) => build_chunks_at(messages, &splits, &conversation.id, config, &base, self.name()),
            None => slide(messages, &conversation.id, config, counter, 0, "sliding-window"),
        };

        Ok(resplit_oversized(chunks, &conversation.id, config, counter))
    }
}

/// Per-message keyword frequency: lowercase, split on non-word characters,
/// drop tokens of length <= 2 and a fixed stop-word set, fold in
/// string-valued metadata fields (spec §4.3.3).
fn extract_keywords(message: &NormalizedMessage) -> HashMap<String, usize> {
    let mut freqs = HashMap::new();
    tally_text(&message.content, &mut freqs);
    if let Value::Object(map) = &message.metadata {
        for value in map.values() {
            if let Value::String(s) = value {
                tally_text(s, &mut freqs);
            }
        }
    }
    freqs
}

fn tally_text(text: &str, freqs: &mut HashMap<String, usize>) {
    let lowered = text.to_lowercase();
    for token in word_regex().split(&lowered) {
        if token.len() <= 2 || STOP_WORDS.contains(&token) {
            continue;
        }
        *freqs.entry(token.to_string()).or_insert(0) += 1;
    }
}

fn combine(messages: &[HashMap<String, usize>]) -> HashMap<String, usize> {
    let mut combined = HashMap::new();
    for freq in messages {
        for (word, count) in freq {
            *combined.entry(word.clone()).or_insert(0) += count;
        }
    }
    combined
}

/// Weighted Jaccard similarity: intersection = sum of min(freq), union = sum
/// of max(freq). Two empty windows are treated as identical (similarity 1.0,
/// never a boundary).
fn weighted_jaccard(a: &HashMap<String, usize>, b: &HashMap<String, usize>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
    let mut intersection = 0usize;
    let mut union = 0usize;
    for key in keys {
        let av = a.get(key).copied().unwrap_or(0);
        let bv = b.get(key).copied().unwrap_or(0);
        intersection += av.min(bv);
        union += av.max(bv);
    }
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Boundary `i` (between `messages[i]` and `messages[i+1]`) is a candidate
/// when the similarity between the preceding and following 3-message windows
/// falls below the moderate threshold — this already subsumes the "strong"
/// (< 0.3) threshold since it is stricter.
fn semantic_candidates(keyword_freqs: &[HashMap<String, usize>], moderate_threshold: f64) -> HashSet<usize> {
    let len = keyword_freqs.len();
    if len < 2 {
        return HashSet::new();
    }
    (0..len - 1)
        .filter(|&i| {
            let before_start = (i + 1).saturating_sub(WINDOW);
            let before = combine(&keyword_freqs[before_start..=i]);
            let after_end = (i + 1 + WINDOW).min(len);
            let after = combine(&keyword_freqs[i + 1..after_end]);
            weighted_jaccard(&before, &after) < moderate_threshold
        })
        .collect()
}

/// Re-splits any chunk that still exceeds `max_tokens_per_chunk` by running
/// sliding-window over just that chunk's messages, annotating the resulting
/// fragments' strategy as `semantic (fallback to sliding-window)`, then
/// renumbers the whole sequence.
fn resplit_oversized(chunks: Vec<Chunk>, conversation_id: &str, config: &ChunkingConfig, counter: &TokenCounter) -> Vec<Chunk> {
    let mut flattened = Vec::new();
    for chunk in chunks {
        if chunk.token_count <= config.max_tokens_per_chunk {
            flattened.push(chunk);
            continue;
        }
        let offset = chunk.start_index;
        let mut fragments = slide(&chunk.messages, conversation_id, config, counter, 0, "semantic (fallback to sliding-window)");
        if fragments.is_empty() {
            flattened.push(chunk);
            continue;
        }
        for fragment in &mut fragments {
            fragment.start_index += offset;
            fragment.end_index += offset;
        }
        if let Some(first) = fragments.first_mut() {
            first.overlap_with_previous = chunk.overlap_with_previous;
            first.overlap_tokens_with_previous = chunk.overlap_tokens_with_previous;
        }
        if let Some(last) = fragments.last_mut() {
            last.overlap_with_next = chunk.overlap_with_next;
            last.overlap_tokens_with_next = chunk.overlap_tokens_with_next;
        }
        flattened.extend(fragments);
    }

    let total = flattened.len();
    for (i, chunk) in flattened.iter_mut().enumerate() {
        chunk.sequence = i + 1;
        chunk.total_chunks = total;
        chunk.id = Chunk::deterministic_id(conversation_id, chunk.sequence);
    }
    flattened
}
