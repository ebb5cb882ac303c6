/// Errors surfaced by the parser registry and individual provider parsers.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("parse failed for provider {provider} at index {index}: {cause}")]
    ParseFailed {
        provider: String,
        index: usize,
        cause: String,
    },

    #[error("validation failed: {0:?}")]
    ValidationFailed(Vec<String>),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("too many conversations: {count} exceeds limit of {limit}")]
    TooManyConversations { count: usize, limit: usize },

    #[error("detection failed: no parser recognized the input")]
    DetectionFailed,

    #[error("input is not valid JSON: {0}")]
    NotJson(String),
}
