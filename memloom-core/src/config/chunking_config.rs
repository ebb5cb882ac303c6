use serde::{Deserialize, Serialize};

use crate::models::TokenCountMethod;

/// Named chunking strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkingStrategyName {
    SlidingWindow,
    Boundary,
    Semantic,
    Custom(String),
}

impl Default for ChunkingStrategyName {
    fn default() -> Self {
        ChunkingStrategyName::SlidingWindow
    }
}

/// Configuration consumed by every chunking strategy and the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens_per_chunk: usize,
    /// Wins over `overlap_percentage` if both are set.
    pub overlap_tokens: Option<usize>,
    pub overlap_percentage: Option<f64>,
    pub min_chunk_size: Option<usize>,
    pub strategy: ChunkingStrategyName,
    /// Must be true: messages are never split across chunks.
    pub preserve_message_boundaries: bool,
    pub token_count_method: TokenCountMethod,
    /// Tunable semantic-similarity thresholds (Open Question, spec §9).
    pub semantic_moderate_threshold: f64,
    pub semantic_strong_threshold: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: 2000,
            overlap_tokens: None,
            overlap_percentage: Some(0.1),
            min_chunk_size: None,
            strategy: ChunkingStrategyName::default(),
            preserve_message_boundaries: true,
            token_count_method: TokenCountMethod::CharDivide,
            semantic_moderate_threshold: 0.5,
            semantic_strong_threshold: 0.3,
        }
    }
}

impl ChunkingConfig {
    /// Overlap token budget: `overlapTokens` if set, else
    /// `floor(maxTokensPerChunk * overlapPercentage)`, else 0.
    pub fn overlap_budget(&self) -> usize {
        if let Some(tokens) = self.overlap_tokens {
            return tokens;
        }
        if let Some(pct) = self.overlap_percentage {
            return ((self.max_tokens_per_chunk as f64) * pct).floor() as usize;
        }
        0
    }

    /// Minimum viable chunk size: `minChunkSize` if set, else 20% of max.
    pub fn min_chunk_size(&self) -> usize {
        self.min_chunk_size
            .unwrap_or_else(|| ((self.max_tokens_per_chunk as f64) * 0.2).floor() as usize)
    }

    /// Fails loudly on configuration that the chunking strategies cannot honor.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens_per_chunk == 0 {
            return Err("maxTokensPerChunk must be > 0".to_string());
        }
        // overlap_tokens is a usize, so `>= 0` is guaranteed by the type.
        if let Some(pct) = self.overlap_percentage {
            if !(0.0..1.0).contains(&pct) {
                return Err("overlapPercentage must be in [0, 1)".to_string());
            }
        }
        if !self.preserve_message_boundaries {
            return Err("preserveMessageBoundaries must be true".to_string());
        }
        let overlap = self.overlap_budget();
        if overlap >= self.max_tokens_per_chunk {
            return Err("effective overlap must be strictly less than maxTokensPerChunk".to_string());
        }
        if (overlap as f64) > 0.9 * (self.max_tokens_per_chunk as f64) {
            return Err("effective overlap must be <= 90% of maxTokensPerChunk".to_string());
        }
        Ok(())
    }
}
