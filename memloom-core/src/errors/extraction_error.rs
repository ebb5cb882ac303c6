/// Errors raised by LLM-driven extraction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error("llm error from provider {provider} on {context_id}: {message}")]
    LlmFailed {
        provider: String,
        context_id: String,
        message: String,
        #[source]
        cause: Option<LlmCause>,
    },

    #[error("llm call timed out after {elapsed_ms}ms for {context_id}")]
    Timeout { context_id: String, elapsed_ms: u64 },

    #[error("llm response did not conform to schema: {0}")]
    SchemaMismatch(String),
}

/// Boxed cause kept cloneable so `ChunkResult` (§3) can carry it by value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct LlmCause(pub String);
