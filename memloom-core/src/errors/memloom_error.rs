use super::{
    ChunkingError, ConsolidationError, ExtractionError, ParseError, RetrievalError, StorageError,
};

/// Top-level error type for the memloom pipeline.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum MemloomError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("consolidation error: {0}")]
    Consolidation(#[from] ConsolidationError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias.
pub type MemloomResult<T> = Result<T, MemloomError>;
