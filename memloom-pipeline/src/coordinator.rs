use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use memloom_chunking::{BatchAborted, ChunkingOrchestrator, FailureMode, ProcessingMode};
use memloom_consolidation::{merge_duplicates, rewire_relationships};
use memloom_core::config::MemloomConfig;
use memloom_core::errors::{MemloomError, ParseError};
use memloom_core::models::{ExtractedMemory, ExtractedRelationship, NormalizedConversation};
use memloom_core::traits::{LlmProvider, StorageClient};
use memloom_parsers::{ParseErrorRecord, ParserRegistry};
use memloom_tokens::TokenCounter;
use memloom_validation::{validate_memories, validate_relationships, ValidationIssue};

use crate::extractor::StrategyChunkExtractor;

/// `{chunking, extraction, deduplication, total}` in milliseconds (spec §4.4).
#[derive(Debug, Clone, Default)]
pub struct TimingBreakdown {
    pub chunking_ms: u64,
    pub extraction_ms: u64,
    pub deduplication_ms: u64,
    pub total_ms: u64,
}

/// The coordinator's full output: persisted-shape memories and
/// relationships plus the diagnostics a caller needs to judge a run's
/// health without re-deriving them (spec §7's "partial results are always
/// surfaced alongside the per-item error list").
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub memories: Vec<ExtractedMemory>,
    pub relationships: Vec<ExtractedRelationship>,
    pub conversations_processed: usize,
    pub chunk_success_count: usize,
    pub chunk_failure_count: usize,
    pub parse_errors: Vec<ParseErrorRecord>,
    pub validation_errors: Vec<ValidationIssue>,
    pub timing: TimingBreakdown,
}

impl PipelineRun {
    /// A run is considered successful overall if every conversation parsed
    /// and every chunk that was attempted succeeded; partial degradation is
    /// still surfaced through the fields above rather than hidden.
    pub fn is_fully_successful(&self) -> bool {
        self.parse_errors.is_empty() && self.chunk_failure_count == 0 && self.validation_errors.is_empty()
    }
}

/// Glues the parser registry, chunking orchestrator, extraction strategy,
/// deduplicator, and validator into one run over a raw export payload (spec
/// §2's pipeline coordinator, §4.4's aggregation, §4.9 in the expanded
/// spec). Optionally persists the surviving memories/relationships through
/// an injected `StorageClient`.
pub struct PipelineCoordinator {
    parsers: Arc<ParserRegistry>,
    orchestrator: Arc<ChunkingOrchestrator>,
    llm: Arc<dyn LlmProvider>,
    storage: Option<Arc<dyn StorageClient>>,
    config: MemloomConfig,
    mode: ProcessingMode,
}

impl PipelineCoordinator {
    pub fn new(
        parsers: Arc<ParserRegistry>,
        counter: Arc<TokenCounter>,
        llm: Arc<dyn LlmProvider>,
        config: MemloomConfig,
    ) -> Self {
        Self {
            parsers,
            orchestrator: Arc::new(ChunkingOrchestrator::with_builtins(counter)),
            llm,
            storage: None,
            config,
            mode: ProcessingMode::sequential(FailureMode::ContinueOnError),
        }
    }

    /// Persisted memories/relationships are saved through `storage` after
    /// validation, when set. Without a storage client the run is still
    /// fully computed; only the save step is skipped.
    pub fn with_storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Overrides the default sequential/continue-on-error processing mode.
    /// Sequential mode is required whenever cross-chunk context carry
    /// matters (spec §4.4, §9); callers opting into parallel mode accept
    /// that `ChunkContext` will not be threaded between chunks.
    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs the full pipeline over a raw export payload: JSON-decode,
    /// detect-or-select provider, parse, chunk + extract each conversation,
    /// merge across the whole run, validate, and (if configured) persist.
    ///
    /// `provider_hint` skips auto-detection when set, parsing directly with
    /// the named provider; `enable_auto_detection` in the pipeline config
    /// otherwise governs whether detection runs at all (a `None` hint with
    /// detection disabled is a `ProviderNotFound` error, since there is
    /// nothing left to select a parser by).
    pub async fn run(&self, raw_bytes: &[u8], workspace_id: &str, provider_hint: Option<&str>) -> Result<PipelineRun, MemloomError> {
        let started = Instant::now();

        if raw_bytes.len() > self.config.pipeline.max_file_size {
            return Err(MemloomError::Parse(ParseError::FileTooLarge {
                size: raw_bytes.len(),
                limit: self.config.pipeline.max_file_size,
            }));
        }

        let raw: serde_json::Value = serde_json::from_slice(raw_bytes).map_err(|err| ParseError::NotJson(err.to_string()))?;

        let strict = self.config.pipeline.strict;
        let outcome = match provider_hint {
            Some(provider) => self.parsers.parse_with(provider, &raw, strict)?,
            None => {
                if !self.config.pipeline.enable_auto_detection {
                    return Err(ParseError::ProviderNotFound("none provided and auto-detection is disabled".to_string()).into());
                }
                let detection = self.parsers.detect(&raw)?;
                info!(provider = %detection.provider, confidence = ?detection.confidence, "auto-detected provider");
                self.parsers.parse_with(&detection.provider, &raw, strict)?
            }
        };

        if outcome.conversations.len() > self.config.pipeline.max_conversations_per_file {
            return Err(MemloomError::Parse(ParseError::TooManyConversations {
                count: outcome.conversations.len(),
                limit: self.config.pipeline.max_conversations_per_file,
            }));
        }

        let mut chunking_ms = 0u64;
        let mut extraction_ms = 0u64;
        let mut all_memories = Vec::new();
        let mut all_relationships = Vec::new();
        let mut chunk_success_count = 0usize;
        let mut chunk_failure_count = 0usize;

        for conversation in &outcome.conversations {
            let chunk_started = Instant::now();
            let chunks = self.orchestrator.chunk(conversation, &self.config.chunking)?;
            chunking_ms += chunk_started.elapsed().as_millis() as u64;

            let extractor = Arc::new(StrategyChunkExtractor::new(
                self.llm.clone(),
                self.config.extraction.clone(),
                workspace_id.to_string(),
                conversation.id.clone(),
            ));

            let run = self.orchestrator.run(&chunks, self.mode, extractor).await.map_err(batch_aborted_to_error)?;
            extraction_ms += run.extraction_duration_ms;
            chunk_success_count += run.metrics.success_count;
            chunk_failure_count += run.metrics.failure_count;
            all_memories.extend(run.memories);
            all_relationships.extend(run.relationships);
        }

        let dedup_started = Instant::now();
        let merge_outcome = merge_duplicates(all_memories);
        let surviving_ids: HashSet<String> = merge_outcome.memories.iter().map(|m| m.id.clone()).collect();
        let relationships = rewire_relationships(all_relationships, &merge_outcome.id_map, &surviving_ids);
        let deduplication_ms = dedup_started.elapsed().as_millis() as u64;

        let memory_report = validate_memories(merge_outcome.memories, &self.config.validator);
        let memories_by_id: HashMap<String, &ExtractedMemory> = memory_report.valid.iter().map(|m| (m.id.clone(), m)).collect();
        let relationship_report = validate_relationships(relationships, &memories_by_id);

        let mut validation_errors = memory_report.errors;
        validation_errors.extend(relationship_report.errors);

        if !memory_report.invalid.is_empty() {
            warn!(count = memory_report.invalid.len(), "dropping memories that failed validation");
        }

        if let Some(storage) = &self.storage {
            for memory in &memory_report.valid {
                storage.save_memory(memory.clone()).await?;
            }
            for relationship in &relationship_report.valid {
                storage.save_relationship(relationship.clone()).await?;
            }
        }

        let total_ms = started.elapsed().as_millis() as u64;

        Ok(PipelineRun {
            memories: memory_report.valid,
            relationships: relationship_report.valid,
            conversations_processed: outcome.conversations.len(),
            chunk_success_count,
            chunk_failure_count,
            parse_errors: outcome.errors,
            validation_errors,
            timing: TimingBreakdown { chunking_ms, extraction_ms, deduplication_ms, total_ms },
        })
    }

    /// Chunks and extracts a single already-normalized conversation,
    /// bypassing the parser stage. Useful for callers that parse upstream
    /// (e.g. a caller streaming conversations in from storage) but still
    /// want chunking, extraction, dedup, and validation run uniformly.
    pub async fn run_conversation(&self, conversation: &NormalizedConversation, workspace_id: &str) -> Result<PipelineRun, MemloomError> {
        let started = Instant::now();

        let chunk_started = Instant::now();
        let chunks = self.orchestrator.chunk(conversation, &self.config.chunking)?;
        let chunking_ms = chunk_started.elapsed().as_millis() as u64;

        let extractor = Arc::new(StrategyChunkExtractor::new(
            self.llm.clone(),
            self.config.extraction.clone(),
            workspace_id.to_string(),
            conversation.id.clone(),
        ));
        let run = self.orchestrator.run(&chunks, self.mode, extractor).await.map_err(batch_aborted_to_error)?;

        let dedup_started = Instant::now();
        let merge_outcome = merge_duplicates(run.memories);
        let surviving_ids: HashSet<String> = merge_outcome.memories.iter().map(|m| m.id.clone()).collect();
        let relationships = rewire_relationships(run.relationships, &merge_outcome.id_map, &surviving_ids);
        let deduplication_ms = dedup_started.elapsed().as_millis() as u64;

        let memory_report = validate_memories(merge_outcome.memories, &self.config.validator);
        let memories_by_id: HashMap<String, &ExtractedMemory> = memory_report.valid.iter().map(|m| (m.id.clone(), m)).collect();
        let relationship_report = validate_relationships(relationships, &memories_by_id);

        let mut validation_errors = memory_report.errors;
        validation_errors.extend(relationship_report.errors);

        if let Some(storage) = &self.storage {
            for memory in &memory_report.valid {
                storage.save_memory(memory.clone()).await?;
            }
            for relationship in &relationship_report.valid {
                storage.save_relationship(relationship.clone()).await?;
            }
        }

        let total_ms = started.elapsed().as_millis() as u64;

        Ok(PipelineRun {
            memories: memory_report.valid,
            relationships: relationship_report.valid,
            conversations_processed: 1,
            chunk_success_count: run.metrics.success_count,
            chunk_failure_count: run.metrics.failure_count,
            parse_errors: Vec::new(),
            validation_errors,
            timing: TimingBreakdown { chunking_ms, extraction_ms: run.extraction_duration_ms, deduplication_ms, total_ms },
        })
    }
}

fn batch_aborted_to_error(aborted: BatchAborted) -> MemloomError {
    MemloomError::Extraction(memloom_core::errors::ExtractionError::LlmFailed {
        provider: aborted.cause.provider,
        context_id: aborted.chunk_id,
        message: aborted.cause.message,
        cause: aborted.cause.cause.map(memloom_core::errors::LlmCause),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use memloom_extraction::testing::FixtureLlmProvider;
    use serde_json::json;

    fn llm_with_one_fact() -> Arc<dyn LlmProvider> {
        Arc::new(FixtureLlmProvider::new(json!({
            "memories": [{"type": "fact", "content": "the launch date moved to march", "confidence": 0.9, "metadata": {}}],
            "relationships": [],
        })))
    }

    fn simple_export() -> Vec<u8> {
        json!({
            "messages": [
                {"role": "user", "content": "when is the launch?"},
                {"role": "assistant", "content": "the launch date moved to march"},
            ]
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn runs_end_to_end_and_produces_a_memory() {
        let coordinator = PipelineCoordinator::new(
            Arc::new(ParserRegistry::with_builtins()),
            Arc::new(TokenCounter::default()),
            llm_with_one_fact(),
            MemloomConfig::default(),
        );
        let run = coordinator.run(&simple_export(), "ws1", None).await.unwrap();
        assert_eq!(run.conversations_processed, 1);
        assert_eq!(run.chunk_success_count, 1);
        assert_eq!(run.memories.len(), 1);
        assert!(run.is_fully_successful());
    }

    #[tokio::test]
    async fn file_too_large_is_rejected_before_parsing() {
        let mut config = MemloomConfig::default();
        config.pipeline.max_file_size = 4;
        let coordinator =
            PipelineCoordinator::new(Arc::new(ParserRegistry::with_builtins()), Arc::new(TokenCounter::default()), llm_with_one_fact(), config);
        let result = coordinator.run(&simple_export(), "ws1", None).await;
        assert!(matches!(result, Err(MemloomError::Parse(ParseError::FileTooLarge { .. }))));
    }

    #[tokio::test]
    async fn unrecognized_provider_hint_is_a_provider_not_found_error() {
        let coordinator = PipelineCoordinator::new(
            Arc::new(ParserRegistry::with_builtins()),
            Arc::new(TokenCounter::default()),
            llm_with_one_fact(),
            MemloomConfig::default(),
        );
        let result = coordinator.run(&simple_export(), "ws1", Some("nonexistent")).await;
        assert!(matches!(result, Err(MemloomError::Parse(ParseError::ProviderNotFound(_)))));
    }
}
