use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use memloom_chunking::ChunkExtractor;
use memloom_core::config::ExtractionConfig;
use memloom_core::models::{Chunk, ChunkContext, ChunkResult};
use memloom_core::traits::LlmProvider;
use memloom_extraction::ExtractionStrategy;

/// Adapts `memloom_extraction::ExtractionStrategy` to the chunking
/// orchestrator's `ChunkExtractor` trait, so the orchestrator's sequential
/// and parallel runners can drive extraction without depending on the
/// extraction crate's LLM machinery directly (spec §4.4/§4.5 seam).
pub struct StrategyChunkExtractor {
    llm: Arc<dyn LlmProvider>,
    config: ExtractionConfig,
    workspace_id: String,
    conversation_id: String,
}

impl StrategyChunkExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ExtractionConfig, workspace_id: String, conversation_id: String) -> Self {
        Self { llm, config, workspace_id, conversation_id }
    }
}

#[async_trait]
impl ChunkExtractor for StrategyChunkExtractor {
    async fn extract(&self, chunk: &Chunk, context: Option<&ChunkContext>) -> ChunkResult {
        let started = Instant::now();
        let strategy = ExtractionStrategy::new(self.llm.as_ref(), &self.config);
        let result = strategy
            .extract(&chunk.messages, &self.workspace_id, &self.conversation_id, &chunk.id, context)
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok((mut memories, relationships)) => {
                for memory in &mut memories {
                    memory.source_chunk_ids = vec![chunk.id.clone()];
                }
                ChunkResult::success(chunk.id.clone(), memories, relationships, chunk.token_count, duration_ms)
            }
            Err(err) => ChunkResult::failed(chunk.id.clone(), chunk.token_count, duration_ms, &err),
        }
    }
}
