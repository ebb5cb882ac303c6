use std::collections::HashMap;
use std::sync::RwLock;

use memloom_core::errors::RetrievalError;

use crate::types::{RankedResult, SearchResult};

/// Names that ship built-in and can never be overwritten (spec §4.8: "three
/// default templates... cannot be overwritten" applies equally to rankers
/// per the default/custom distinction in spec §9's open question).
const DEFAULT_RANKER_NAMES: &[&str] = &["default", "similarity-only", "recency-only", "confidence-only"];

/// A pure function from scored search results to a reordered, re-scored
/// list. Deterministic: two invocations on identical inputs yield identical
/// order (spec §8 "Ranking determinism").
pub trait Ranker: Send + Sync {
    fn rank(&self, results: &[SearchResult]) -> Vec<RankedResult>;
}

/// Default ranker: linear blend of similarity (0.5), recency (0.3), and
/// confidence (0.2). Recency is normalized against the newest result in the
/// set; ties break on memory id for determinism.
pub struct LinearBlendRanker {
    pub similarity_weight: f64,
    pub recency_weight: f64,
    pub confidence_weight: f64,
}

impl Default for LinearBlendRanker {
    fn default() -> Self {
        Self { similarity_weight: 0.5, recency_weight: 0.3, confidence_weight: 0.2 }
    }
}

impl Ranker for LinearBlendRanker {
    fn rank(&self, results: &[SearchResult]) -> Vec<RankedResult> {
        let newest = results.iter().map(|r| r.memory.created_at).max();
        let oldest = results.iter().map(|r| r.memory.created_at).min();
        let span = match (newest, oldest) {
            (Some(newest), Some(oldest)) => (newest - oldest).num_milliseconds().max(1) as f64,
            _ => 1.0,
        };

        let mut ranked: Vec<RankedResult> = results
            .iter()
            .map(|result| {
                let recency = match newest {
                    Some(newest) => {
                        let age_ms = (newest - result.memory.created_at).num_milliseconds().max(0) as f64;
                        1.0 - (age_ms / span)
                    }
                    None => 0.0,
                };
                let score = self.similarity_weight * result.score
                    + self.recency_weight * recency
                    + self.confidence_weight * result.memory.confidence;
                RankedResult { result: result.clone(), ranking_score: score }
            })
            .collect();
        sort_deterministically(&mut ranked);
        ranked
    }
}

/// Ranks purely on the incoming similarity score.
pub struct SimilarityOnlyRanker;

impl Ranker for SimilarityOnlyRanker {
    fn rank(&self, results: &[SearchResult]) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> =
            results.iter().map(|r| RankedResult { result: r.clone(), ranking_score: r.score }).collect();
        sort_deterministically(&mut ranked);
        ranked
    }
}

/// Ranks purely on recency, newest first.
pub struct RecencyOnlyRanker;

impl Ranker for RecencyOnlyRanker {
    fn rank(&self, results: &[SearchResult]) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> = results
            .iter()
            .map(|r| RankedResult { result: r.clone(), ranking_score: r.memory.created_at.timestamp_millis() as f64 })
            .collect();
        sort_deterministically(&mut ranked);
        ranked
    }
}

/// Ranks purely on the memory's extraction confidence.
pub struct ConfidenceOnlyRanker;

impl Ranker for ConfidenceOnlyRanker {
    fn rank(&self, results: &[SearchResult]) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> =
            results.iter().map(|r| RankedResult { result: r.clone(), ranking_score: r.memory.confidence }).collect();
        sort_deterministically(&mut ranked);
        ranked
    }
}

fn sort_deterministically(ranked: &mut [RankedResult]) {
    ranked.sort_by(|a, b| {
        b.ranking_score
            .partial_cmp(&a.ranking_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.result.memory.id.cmp(&b.result.memory.id))
    });
}

/// Populated at construction with the four built-ins; read-only afterwards
/// except for explicit `register` calls for custom names. Registering under
/// a default name is a hard error rather than a silent replace or a warning
/// — spec §4.8 says default rankers "cannot be overwritten".
pub struct RankerRegistry {
    rankers: RwLock<HashMap<String, Box<dyn Ranker>>>,
}

impl RankerRegistry {
    pub fn with_builtins() -> Self {
        let mut rankers: HashMap<String, Box<dyn Ranker>> = HashMap::new();
        rankers.insert("default".to_string(), Box::new(LinearBlendRanker::default()));
        rankers.insert("similarity-only".to_string(), Box::new(SimilarityOnlyRanker));
        rankers.insert("recency-only".to_string(), Box::new(RecencyOnlyRanker));
        rankers.insert("confidence-only".to_string(), Box::new(ConfidenceOnlyRanker));
        Self { rankers: RwLock::new(rankers) }
    }

    /// Registers a custom ranker under `name`. Replaces an existing custom
    /// registration (logged by the caller's tracing if desired); rejects
    /// overwriting one of the default names.
    pub fn register(&self, name: &str, ranker: Box<dyn Ranker>) -> Result<(), RetrievalError> {
        if DEFAULT_RANKER_NAMES.contains(&name) {
            return Err(RetrievalError::DefaultOverwrite { kind: "ranker", name: name.to_string() });
        }
        self.rankers.write().expect("ranker registry lock poisoned").insert(name.to_string(), ranker);
        Ok(())
    }

    pub fn rank(&self, name: &str, results: &[SearchResult]) -> Result<Vec<RankedResult>, RetrievalError> {
        let rankers = self.rankers.read().expect("ranker registry lock poisoned");
        let ranker = rankers.get(name).ok_or_else(|| RetrievalError::RankerNotFound(name.to_string()))?;
        Ok(ranker.rank(results))
    }
}

impl Default for RankerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memloom_core::models::ExtractedMemory;
    use serde_json::Value;

    fn memory(id: &str, confidence: f64, age_ms_ago: i64) -> ExtractedMemory {
        ExtractedMemory {
            id: id.to_string(),
            memory_type: "fact".to_string(),
            content: "x".to_string(),
            confidence,
            workspace_id: "ws".to_string(),
            conversation_id: "conv".to_string(),
            source_message_ids: vec![],
            source_chunk_ids: vec![],
            metadata: Value::Null,
            created_at: chrono::Utc::now() - chrono::Duration::milliseconds(age_ms_ago),
            merged_from: vec![],
        }
    }

    fn result(id: &str, score: f64, confidence: f64, age_ms_ago: i64) -> SearchResult {
        SearchResult { memory: memory(id, confidence, age_ms_ago), score, expansion: None }
    }

    #[test]
    fn ranking_is_deterministic_across_repeated_calls() {
        let results = vec![result("a", 0.5, 0.5, 1000), result("b", 0.9, 0.1, 500), result("c", 0.2, 0.9, 0)];
        let ranker = LinearBlendRanker::default();
        let first: Vec<String> = ranker.rank(&results).iter().map(|r| r.result.memory.id.clone()).collect();
        let second: Vec<String> = ranker.rank(&results).iter().map(|r| r.result.memory.id.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ties_break_on_memory_id() {
        let results = vec![result("b", 0.5, 0.5, 100), result("a", 0.5, 0.5, 100)];
        let ranker = SimilarityOnlyRanker;
        let ranked = ranker.rank(&results);
        assert_eq!(ranked[0].result.memory.id, "a");
    }

    #[test]
    fn default_ranker_names_cannot_be_overwritten() {
        let registry = RankerRegistry::with_builtins();
        let err = registry.register("default", Box::new(SimilarityOnlyRanker)).unwrap_err();
        assert!(matches!(err, RetrievalError::DefaultOverwrite { .. }));
    }

    #[test]
    fn custom_ranker_can_be_registered_and_used() {
        let registry = RankerRegistry::with_builtins();
        registry.register("my-ranker", Box::new(ConfidenceOnlyRanker)).unwrap();
        let results = vec![result("a", 0.1, 0.9, 0), result("b", 0.9, 0.1, 0)];
        let ranked = registry.rank("my-ranker", &results).unwrap();
        assert_eq!(ranked[0].result.memory.id, "a");
    }

    #[test]
    fn unknown_ranker_name_is_an_error() {
        let registry = RankerRegistry::with_builtins();
        let err = registry.rank("nope", &[]).unwrap_err();
        assert!(matches!(err, RetrievalError::RankerNotFound(_)));
    }
}
