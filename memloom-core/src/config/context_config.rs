use serde::{Deserialize, Serialize};

use crate::models::TokenCountMethod;

/// Bounded-cache shape shared by the token counter and the embedding cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl_seconds: 3600,
        }
    }
}

/// Configuration for the context engine (retrieval + formatting).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub default_template: String,
    pub default_token_budget: usize,
    pub cache_config: CacheConfig,
    /// If set, `searchByVector` rejects vectors whose length doesn't match.
    pub expected_embedding_dimensions: Option<usize>,
    pub default_relationship_depth: usize,
    /// The tokenizer the formatter uses to measure candidate additions
    /// against the budget.
    pub token_count_method: TokenCountMethod,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_template: "chat".to_string(),
            default_token_budget: 4000,
            cache_config: CacheConfig::default(),
            expected_embedding_dimensions: None,
            default_relationship_depth: 1,
            token_count_method: TokenCountMethod::CharDivide,
        }
    }
}
