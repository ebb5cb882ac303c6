//! LLM test doubles, available to downstream crates under the `testing`
//! feature so pipeline-level tests don't need a real provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use memloom_core::config::ModelParams;
use memloom_core::errors::ExtractionError;
use memloom_core::traits::LlmProvider;

/// Always returns an empty `{memories: [], relationships: []}` response.
pub struct EchoLlmProvider;

#[async_trait]
impl LlmProvider for EchoLlmProvider {
    async fn complete_structured(&self, _prompt: &str, _json_schema: &Value, _params: &ModelParams) -> Result<Value, ExtractionError> {
        Ok(json!({"memories": [], "relationships": []}))
    }

    async fn complete(&self, _prompt: &str, _params: &ModelParams) -> Result<String, ExtractionError> {
        Ok(String::new())
    }

    fn provider_tag(&self) -> &str {
        "echo"
    }
}

/// Returns a fixed response regardless of prompt, for tests that need
/// deterministic extraction output.
pub struct FixtureLlmProvider {
    response: Value,
}

impl FixtureLlmProvider {
    pub fn new(response: Value) -> Self {
        Self { response }
    }
}

#[async_trait]
impl LlmProvider for FixtureLlmProvider {
    async fn complete_structured(&self, _prompt: &str, _json_schema: &Value, _params: &ModelParams) -> Result<Value, ExtractionError> {
        Ok(self.response.clone())
    }

    async fn complete(&self, _prompt: &str, _params: &ModelParams) -> Result<String, ExtractionError> {
        Ok(self.response.to_string())
    }

    fn provider_tag(&self) -> &str {
        "fixture"
    }
}

/// Always fails with a timeout error, for exercising failure paths.
pub struct FailingLlmProvider;

#[async_trait]
impl LlmProvider for FailingLlmProvider {
    async fn complete_structured(&self, _prompt: &str, _json_schema: &Value, _params: &ModelParams) -> Result<Value, ExtractionError> {
        Err(ExtractionError::LlmFailed {
            provider: "failing-test-double".to_string(),
            context_id: "unknown".to_string(),
            message: "forced test failure".to_string(),
            cause: None,
        })
    }

    async fn complete(&self, _prompt: &str, _params: &ModelParams) -> Result<String, ExtractionError> {
        Err(ExtractionError::LlmFailed {
            provider: "failing-test-double".to_string(),
            context_id: "unknown".to_string(),
            message: "forced test failure".to_string(),
            cause: None,
        })
    }

    fn provider_tag(&self) -> &str {
        "failing-test-double"
    }
}
