//! Cross-chunk deduplication/merging and relationship rewiring (spec §4.6).

mod merge;
mod rewire;

pub use merge::{merge_duplicates, MergeOutcome};
pub use rewire::rewire_relationships;
