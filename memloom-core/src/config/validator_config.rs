use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub min_confidence: Option<f64>,
    pub min_content_length: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_confidence: None,
            min_content_length: 3,
        }
    }
}
