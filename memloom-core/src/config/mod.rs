mod chunking_config;
mod context_config;
mod extraction_config;
mod pipeline_config;
mod validator_config;

use serde::{Deserialize, Serialize};

pub use chunking_config::{ChunkingConfig, ChunkingStrategyName};
pub use context_config::{CacheConfig, ContextConfig};
pub use extraction_config::{ExtractionConfig, MemoryTypeSpec, ModelParams};
pub use pipeline_config::PipelineConfig;
pub use validator_config::ValidatorConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemloomConfig {
    pub pipeline: PipelineConfig,
    pub chunking: ChunkingConfig,
    pub extraction: ExtractionConfig,
    pub context: ContextConfig,
    pub validator: ValidatorConfig,
}

impl MemloomConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
