mod embedding_provider;
mod llm_provider;
mod storage_client;

pub use embedding_provider::{validate_vector, EmbeddingProvider};
pub use llm_provider::LlmProvider;
pub use storage_client::{MemoryUpdate, ScoredMemory, SearchFilters, StorageClient};
