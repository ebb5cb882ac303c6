use async_trait::async_trait;
use serde_json::Value;

use crate::config::ModelParams;
use crate::errors::ExtractionError;

/// The LLM collaborator memloom consumes. `complete_structured` is the
/// primary mode; `complete` is a degraded fallback that returns raw text the
/// caller must parse itself. memloom never relies on partial/streaming
/// responses from either.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete_structured(
        &self,
        prompt: &str,
        json_schema: &Value,
        params: &ModelParams,
    ) -> Result<Value, ExtractionError>;

    async fn complete(&self, prompt: &str, params: &ModelParams) -> Result<String, ExtractionError>;

    /// A stable tag for this provider, used in error messages (§7).
    fn provider_tag(&self) -> &str;
}
