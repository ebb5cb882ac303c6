/// Errors from chunking strategy configuration and selection.
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    #[error("invalid chunking config: {0}")]
    InvalidConfig(String),

    #[error("strategy not found: {0}")]
    StrategyNotFound(String),

    #[error("strategy {strategy} cannot handle conversation {conversation_id}: {reason}")]
    StrategyCannotHandle {
        strategy: String,
        conversation_id: String,
        reason: String,
    },
}
