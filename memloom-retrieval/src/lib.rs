//! Context engine: embedding cache, ranked retrieval, relationship
//! expansion, and budgeted template formatting (spec §4.8).

mod cache;
mod engine;
mod expansion;
mod formatter;
mod ranking;
mod template;
mod types;

pub use cache::EmbeddingCache;
pub use engine::{ContextEngine, ContextResult, PreviewResult};
pub use expansion::{clamp_depth, expand};
pub use formatter::{format_context, FormatResult};
pub use ranking::{
    ConfidenceOnlyRanker, LinearBlendRanker, Ranker, RankerRegistry, RecencyOnlyRanker, SimilarityOnlyRanker,
};
pub use template::{Template, TemplateRegistry};
pub use types::{ExpansionInfo, RankedResult, SearchOptions, SearchResult};
