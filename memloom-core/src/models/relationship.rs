use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed, directed edge between two `ExtractedMemory` ids.
///
/// Invariants (enforced by the validator and by consolidation's rewiring,
/// not by construction): both endpoints exist in the final memory set and
/// share a workspace; self-edges are allowed; duplicate `(from, to, type)`
/// tuples collapse to the highest-confidence instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    pub id: String,
    pub from_memory_id: String,
    pub to_memory_id: String,
    pub relationship_type: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl ExtractedRelationship {
    /// The `(from, to, type)` identity used for duplicate collapsing.
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.from_memory_id.clone(),
            self.to_memory_id.clone(),
            self.relationship_type.clone(),
        )
    }
}
