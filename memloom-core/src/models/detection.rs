use serde::{Deserialize, Serialize};

/// How confident the auto-detector is that it picked the right parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionConfidence {
    High,
    Medium,
    Low,
}

/// Outcome of `ParserRegistry::detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub provider: String,
    pub confidence: DetectionConfidence,
    pub matched_patterns: Vec<String>,
}
