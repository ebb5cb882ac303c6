mod chunking_error;
mod consolidation_error;
mod extraction_error;
mod memloom_error;
mod parse_error;
mod retrieval_error;
mod storage_error;

pub use chunking_error::ChunkingError;
pub use consolidation_error::ConsolidationError;
pub use extraction_error::{ExtractionError, LlmCause};
pub use memloom_error::{MemloomError, MemloomResult};
pub use parse_error::ParseError;
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;
