use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use memloom_core::config::ChunkingConfig;
use memloom_core::errors::ChunkingError;
use memloom_core::models::{
    Chunk, ChunkContext, ChunkResult, ChunkResultError, ChunkStatus, ExtractedMemory, ExtractedRelationship,
    NormalizedConversation,
};
use memloom_tokens::TokenCounter;

use crate::base::ChunkingBase;
use crate::strategy::StrategyRegistry;

/// How a single chunk's extraction failure affects the rest of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    FailFast,
    ContinueOnError,
}

/// Sequential mode threads `ChunkContext` from one chunk to the next;
/// parallel mode never does (spec §4.4/§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Sequential { failure_mode: FailureMode },
    Parallel { concurrency: usize, failure_mode: FailureMode },
}

impl ProcessingMode {
    pub fn sequential(failure_mode: FailureMode) -> Self {
        ProcessingMode::Sequential { failure_mode }
    }

    /// Default concurrency of 3 (spec §7).
    pub fn parallel(failure_mode: FailureMode) -> Self {
        ProcessingMode::Parallel { concurrency: 3, failure_mode }
    }
}

/// Per-chunk extraction, injected so the orchestrator need not depend on the
/// extraction crate's LLM machinery.
#[async_trait]
pub trait ChunkExtractor: Send + Sync {
    async fn extract(&self, chunk: &Chunk, context: Option<&ChunkContext>) -> ChunkResult;
}

/// Raised when a fail-fast run aborts: carries the failing chunk's id and
/// the error attached to its `ChunkResult`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("chunk {chunk_id} failed, aborting batch: {}", cause.message)]
pub struct BatchAborted {
    pub chunk_id: String,
    pub cause: ChunkResultError,
}

#[derive(Debug, Clone, Default)]
pub struct BatchMetrics {
    pub min_chunk_tokens: usize,
    pub max_chunk_tokens: usize,
    pub avg_chunk_tokens: f64,
    pub avg_memories_per_chunk: f64,
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone)]
pub struct OrchestratorRun {
    pub chunk_results: Vec<ChunkResult>,
    pub memories: Vec<ExtractedMemory>,
    pub relationships: Vec<ExtractedRelationship>,
    pub metrics: BatchMetrics,
    pub extraction_duration_ms: u64,
}

/// Selects a chunking strategy, decides whether a conversation needs
/// chunking at all, and runs per-chunk extraction sequentially (with context
/// carry) or bounded-parallel (spec §4.4).
pub struct ChunkingOrchestrator {
    strategies: Arc<StrategyRegistry>,
    counter: Arc<TokenCounter>,
}

impl ChunkingOrchestrator {
    pub fn new(strategies: Arc<StrategyRegistry>, counter: Arc<TokenCounter>) -> Self {
        Self { strategies, counter }
    }

    pub fn with_builtins(counter: Arc<TokenCounter>) -> Self {
        Self::new(Arc::new(StrategyRegistry::with_builtins()), counter)
    }

    pub fn strategies(&self) -> &Arc<StrategyRegistry> {
        &self.strategies
    }

    /// Whole-conversation token count vs `maxTokensPerChunk`.
    pub fn needs_chunking(&self, conversation: &NormalizedConversation, config: &ChunkingConfig) -> bool {
        let base = ChunkingBase::new(&self.counter, config.token_count_method);
        let total: usize = conversation.messages.iter().map(|m| base.message_tokens(m)).sum();
        total > config.max_tokens_per_chunk
    }

    fn strategy_name(&self, config: &ChunkingConfig) -> String {
        use memloom_core::config::ChunkingStrategyName;
        match &config.strategy {
            ChunkingStrategyName::SlidingWindow => "sliding-window".to_string(),
            ChunkingStrategyName::Boundary => "boundary".to_string(),
            ChunkingStrategyName::Semantic => "semantic".to_string(),
            ChunkingStrategyName::Custom(name) => name.clone(),
        }
    }

    /// Produces the chunk sequence for a conversation. A conversation that
    /// does not need chunking is returned as a single whole-conversation
    /// chunk without invoking a splitting strategy.
    pub fn chunk(&self, conversation: &NormalizedConversation, config: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
        if !self.needs_chunking(conversation, config) {
            return Ok(vec![whole_conversation_chunk(conversation, config, &self.counter)]);
        }
        let name = self.strategy_name(config);
        self.strategies.get(&name)?;
        self.strategies.chunk_with(&name, conversation, config, &self.counter)
    }

    /// Runs extraction over `chunks` per `mode`, aggregating into a single
    /// `OrchestratorRun`. Does not itself perform deduplication; the pipeline
    /// coordinator folds this run's output together with dedup timing to
    /// build the full `{chunking, extraction, deduplication, total}` timing
    /// breakdown (spec §4.4's aggregation step).
    pub async fn run(
        &self,
        chunks: &[Chunk],
        mode: ProcessingMode,
        extractor: Arc<dyn ChunkExtractor>,
    ) -> Result<OrchestratorRun, BatchAborted> {
        let started = Instant::now();
        let chunk_results = match mode {
            ProcessingMode::Sequential { failure_mode } => run_sequential(chunks, extractor, failure_mode).await?,
            ProcessingMode::Parallel { concurrency, failure_mode } => {
                run_parallel(chunks, extractor, concurrency.max(1), failure_mode).await?
            }
        };
        Ok(aggregate(chunk_results, started.elapsed().as_millis() as u64))
    }
}

fn whole_conversation_chunk(conversation: &NormalizedConversation, config: &ChunkingConfig, counter: &TokenCounter) -> Chunk {
    let base = ChunkingBase::new(counter, config.token_count_method);
    let token_count: usize = conversation.messages.iter().map(|m| base.message_tokens(m)).sum();
    Chunk {
        id: Chunk::deterministic_id(&conversation.id, 1),
        conversation_id: conversation.id.clone(),
        sequence: 1,
        total_chunks: 1,
        messages: conversation.messages.clone(),
        token_count,
        overlap_with_previous: 0,
        overlap_tokens_with_previous: 0,
        overlap_with_next: 0,
        overlap_tokens_with_next: 0,
        strategy: "none".to_string(),
        created_at: chrono::Utc::now(),
        start_index: 0,
        end_index: conversation.messages.len().saturating_sub(1),
    }
}

async fn run_sequential(
    chunks: &[Chunk],
    extractor: Arc<dyn ChunkExtractor>,
    failure_mode: FailureMode,
) -> Result<Vec<ChunkResult>, BatchAborted> {
    let mut results = Vec::with_capacity(chunks.len());
    let mut context: Option<ChunkContext> = None;
    for chunk in chunks {
        let result = extractor.extract(chunk, context.as_ref()).await;
        if result.status == ChunkStatus::Failed {
            if failure_mode == FailureMode::FailFast {
                let cause = result.error.clone().expect("failed ChunkResult carries an error");
                return Err(BatchAborted { chunk_id: result.chunk_id, cause });
            }
        } else {
            let prior_memories: Vec<(String, String)> =
                result.memories.iter().map(|m| (m.memory_type.clone(), m.content.clone())).collect();
            context = Some(ChunkContext::default_summary(chunk.sequence, chunk.messages.len(), result.memories.len(), prior_memories));
        }
        results.push(result);
    }
    Ok(results)
}

async fn run_parallel(
    chunks: &[Chunk],
    extractor: Arc<dyn ChunkExtractor>,
    concurrency: usize,
    failure_mode: FailureMode,
) -> Result<Vec<ChunkResult>, BatchAborted> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let cancellation = CancellationToken::new();

    let mut futures_unordered = FuturesUnordered::new();
    for chunk in chunks.iter().cloned() {
        let semaphore = semaphore.clone();
        let cancellation = cancellation.clone();
        let extractor = extractor.clone();
        let sequence = chunk.sequence;
        futures_unordered.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("chunking semaphore never closed");
            if failure_mode == FailureMode::FailFast && cancellation.is_cancelled() {
                return None;
            }
            let result = extractor.extract(&chunk, None).await;
            if failure_mode == FailureMode::FailFast && result.status == ChunkStatus::Failed {
                cancellation.cancel();
            }
            Some((sequence, result))
        }));
    }

    let mut results = Vec::with_capacity(chunks.len());
    while let Some(joined) = futures_unordered.next().await {
        if let Some(result) = joined.expect("extraction task panicked") {
            results.push(result);
        }
    }
    // Submission order (spec §5), not completion order or chunk_id string
    // order -- chunk_id is "{conversation_id}:{sequence}" and sorts "10"
    // before "2" lexicographically.
    results.sort_by_key(|(sequence, _)| *sequence);
    let results: Vec<ChunkResult> = results.into_iter().map(|(_, result)| result).collect();

    if failure_mode == FailureMode::FailFast {
        if let Some(failed) = results.iter().find(|r| r.status == ChunkStatus::Failed) {
            return Err(BatchAborted {
                chunk_id: failed.chunk_id.clone(),
                cause: failed.error.clone().expect("failed ChunkResult carries an error"),
            });
        }
    }
    Ok(results)
}

fn aggregate(chunk_results: Vec<ChunkResult>, extraction_duration_ms: u64) -> OrchestratorRun {
    let mut memories = Vec::new();
    let mut relationships = Vec::new();
    let mut token_counts = Vec::new();
    let mut memory_counts = Vec::new();
    let mut success_count = 0usize;
    let mut failure_count = 0usize;

    for result in &chunk_results {
        match result.status {
            ChunkStatus::Success => {
                success_count += 1;
                token_counts.push(result.tokens_processed);
                memory_counts.push(result.memories.len());
                memories.extend(result.memories.clone());
                relationships.extend(result.relationships.clone());
            }
            ChunkStatus::Failed => failure_count += 1,
        }
    }

    let metrics = BatchMetrics {
        min_chunk_tokens: token_counts.iter().copied().min().unwrap_or(0),
        max_chunk_tokens: token_counts.iter().copied().max().unwrap_or(0),
        avg_chunk_tokens: average(&token_counts),
        avg_memories_per_chunk: average(&memory_counts),
        success_count,
        failure_count,
    };

    OrchestratorRun {
        chunk_results,
        memories,
        relationships,
        metrics,
        extraction_duration_ms,
    }
}

fn average(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}
