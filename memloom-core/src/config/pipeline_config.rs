use serde::{Deserialize, Serialize};

/// Top-level pipeline behavior: input limits and error-handling posture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_file_size: usize,
    pub max_conversations_per_file: usize,
    pub enable_auto_detection: bool,
    pub strict: bool,
    pub skip_invalid: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_conversations_per_file: 10_000,
            enable_auto_detection: true,
            strict: false,
            skip_invalid: true,
        }
    }
}
