use chrono::{DateTime, Utc};

use memloom_core::models::ExtractedMemory;

/// How a memory beyond the initial search hit was pulled in: the
/// relationship that led to it and how many hops deep.
#[derive(Debug, Clone)]
pub struct ExpansionInfo {
    pub relationship_type: String,
    pub depth: usize,
    pub via_memory_id: String,
}

/// One memory in a search result, annotated with its similarity score and,
/// if it was pulled in by relationship expansion rather than the vector
/// search itself, how it got there.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub memory: ExtractedMemory,
    pub score: f64,
    pub expansion: Option<ExpansionInfo>,
}

/// Options accepted by `search`/`search_by_vector` (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// `0` means unlimited, mirroring `SearchFilters`.
    pub limit: usize,
    pub types: Option<Vec<String>>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_confidence: Option<f64>,
    /// Client-side filter: restricts results to a single conversation.
    pub conversation_id: Option<String>,
    /// `Some(depth)` turns on relationship expansion; depth is clamped to
    /// `[1, 10]`. `None` disables expansion entirely.
    pub expand_relationships_depth: Option<usize>,
    /// Named ranker to use in `build_context`/`preview_context`; `None`
    /// uses the configured default ("default" unless overridden).
    pub ranker: Option<String>,
}

/// A `SearchResult` with its final ranking score attached, in rank order.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub result: SearchResult,
    pub ranking_score: f64,
}
