//! Field/range and relationship-integrity checks over extracted memories
//! (spec §4.7). Never fails the batch; bad records are set aside with an
//! explanatory issue instead.

mod memory;
mod relationship;

pub use memory::{validate_memories, MemoryValidation};
pub use relationship::{validate_relationships, RelationshipValidation};

/// A single record's validation failure, routed into the `invalid` bucket
/// alongside its source record rather than aborting the batch.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub record_id: String,
    pub field: String,
    pub message: String,
}
