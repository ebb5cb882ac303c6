//! Glues parse -> chunk -> extract -> merge -> validate into a single run
//! (spec §2, §4.9's pipeline coordinator responsibility), emitting a timing
//! breakdown and a success/failure summary alongside whatever memories and
//! relationships the run produced.

mod coordinator;
mod extractor;

pub use coordinator::{PipelineCoordinator, PipelineRun, TimingBreakdown};
pub use extractor::StrategyChunkExtractor;
