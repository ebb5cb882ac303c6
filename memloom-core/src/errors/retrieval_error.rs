/// Errors from the context engine's retrieval and formatting path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding error: {0}")]
    EmbeddingError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector contains a non-finite value at index {index}")]
    NonFiniteVector { index: usize },

    #[error("ranker not found: {0}")]
    RankerNotFound(String),

    #[error("cannot overwrite default {kind} {name:?}")]
    DefaultOverwrite { kind: &'static str, name: String },
}
