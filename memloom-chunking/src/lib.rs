//! Token-budgeted chunking of normalized conversations: shared base helpers,
//! the sliding-window/boundary/semantic strategies, and the orchestrator that
//! selects a strategy and runs chunk extraction sequentially or bounded-
//! parallel.

mod base;
mod boundary;
mod orchestrator;
mod semantic;
mod sliding_window;
mod strategy;

pub use base::{overlap_tail, ChunkingBase};
pub use boundary::BoundaryStrategy;
pub use orchestrator::{
    BatchAborted, BatchMetrics, ChunkExtractor, ChunkingOrchestrator, FailureMode, OrchestratorRun, ProcessingMode,
};
pub use semantic::SemanticStrategy;
pub use sliding_window::SlidingWindowStrategy;
pub use strategy::{ChunkingStrategy, StrategyRegistry};
