use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;
use tracing::warn;

use memloom_core::models::{NormalizedConversation, NormalizedMessage, TokenCount, TokenCountMethod};

/// Provider-identifier substrings mapped to the closest-accuracy counting
/// method, checked case-insensitively in order. Fallback is `CharDivide`.
const PROVIDER_METHOD_TABLE: &[(&str, TokenCountMethod)] = &[
    ("openai", TokenCountMethod::ExactBpe),
    ("gpt", TokenCountMethod::ExactBpe),
    ("chatgpt", TokenCountMethod::ExactBpe),
    ("anthropic", TokenCountMethod::ProviderAEstimate),
    ("claude", TokenCountMethod::ProviderAEstimate),
    ("google", TokenCountMethod::ProviderBEstimate),
    ("gemini", TokenCountMethod::ProviderBEstimate),
    ("bard", TokenCountMethod::ProviderBEstimate),
];

/// LRU+TTL cache key: `(method, blake3(text))`.
type CacheKey = (TokenCountMethod, [u8; 32]);

/// Counts tokens for text/messages/conversations across four interchangeable
/// methods, with a bounded, expiring cache shared across callers.
pub struct TokenCounter {
    cache: Cache<CacheKey, usize>,
    bpe: Option<Arc<CoreBPE>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TokenCounter {
    pub fn new(max_entries: u64, ttl: std::time::Duration) -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(err) => {
                warn!(error = %err, "failed to load BPE tokenizer, exact-bpe will fall back to char-divide");
                None
            }
        };
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            bpe,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Counts tokens in `text` using `method`, consulting and populating the
    /// cache. Falls back to char-divide (with `accuracy` marked accordingly)
    /// if `ExactBpe` was requested but the tokenizer failed to load.
    pub fn count(&self, text: &str, method: TokenCountMethod) -> TokenCount {
        let effective_method = if method == TokenCountMethod::ExactBpe && self.bpe.is_none() {
            TokenCountMethod::CharDivide
        } else {
            method
        };

        let key = (effective_method, *blake3::hash(text.as_bytes()).as_bytes());
        if let Some(tokens) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return TokenCount {
                tokens,
                method: effective_method,
                accuracy: effective_method.accuracy(),
            };
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let tokens = self.compute(text, effective_method);
        self.cache.insert(key, tokens);
        TokenCount {
            tokens,
            method: effective_method,
            accuracy: effective_method.accuracy(),
        }
    }

    fn compute(&self, text: &str, method: TokenCountMethod) -> usize {
        match method {
            TokenCountMethod::ExactBpe => match &self.bpe {
                Some(bpe) => bpe.encode_ordinary(text).len(),
                None => char_divide(text),
            },
            TokenCountMethod::ProviderAEstimate => ceil_div(text.len(), 3.5),
            TokenCountMethod::ProviderBEstimate => ceil_div(text.len(), 3.8),
            TokenCountMethod::CharDivide => char_divide(text),
        }
    }

    /// Counts `"role: content"` for a single message.
    pub fn count_message(&self, message: &NormalizedMessage, method: TokenCountMethod) -> TokenCount {
        self.count(&message.as_counted_text(), method)
    }

    /// Sums `count_message` over every message in the conversation.
    pub fn count_conversation(
        &self,
        conversation: &NormalizedConversation,
        method: TokenCountMethod,
    ) -> TokenCount {
        let mut total = 0usize;
        let mut effective = method;
        for message in &conversation.messages {
            let counted = self.count_message(message, method);
            effective = counted.method;
            total += counted.tokens;
        }
        TokenCount {
            tokens: total,
            method: effective,
            accuracy: effective.accuracy(),
        }
    }

    /// Picks the closest-accuracy method for a provider tag via
    /// case-insensitive substring match; unknown providers fall back to
    /// `CharDivide`.
    pub fn recommended_method(provider_tag: &str) -> TokenCountMethod {
        let lower = provider_tag.to_lowercase();
        PROVIDER_METHOD_TABLE
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, method)| *method)
            .unwrap_or(TokenCountMethod::CharDivide)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits() as f64;
        let misses = self.cache_misses() as f64;
        if hits + misses == 0.0 {
            return 0.0;
        }
        hits / (hits + misses)
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(10_000, std::time::Duration::from_secs(3600))
    }
}

fn char_divide(text: &str) -> usize {
    ceil_div(text.len(), 4.0)
}

fn ceil_div(len: usize, divisor: f64) -> usize {
    if len == 0 {
        return 0;
    }
    (len as f64 / divisor).ceil() as usize
}
