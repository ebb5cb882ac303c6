use std::sync::Arc;

use tracing::debug;

use memloom_core::config::ContextConfig;
use memloom_core::errors::RetrievalError;
use memloom_core::models::ExtractedMemory;
use memloom_core::traits::{validate_vector, EmbeddingProvider, SearchFilters, StorageClient};
use memloom_core::util::truncate_for_log;
use memloom_tokens::TokenCounter;

use crate::cache::EmbeddingCache;
use crate::expansion::expand;
use crate::formatter::format_context;
use crate::ranking::RankerRegistry;
use crate::template::TemplateRegistry;
use crate::types::{RankedResult, SearchOptions, SearchResult};

const QUERY_LOG_TRUNCATE_CHARS: usize = 100;

/// `buildContext`/`buildContextByVector`'s output (spec §4.8).
#[derive(Debug, Clone)]
pub struct ContextResult {
    pub text: String,
    pub memories: Vec<ExtractedMemory>,
    pub token_count: usize,
    pub truncated: bool,
}

/// `previewContext`'s output: `buildContext`'s fields plus ranking diagnostics.
#[derive(Debug, Clone)]
pub struct PreviewResult {
    pub text: String,
    pub memories: Vec<ExtractedMemory>,
    pub token_count: usize,
    pub truncated: bool,
    pub memory_ids: Vec<String>,
    pub ranking_scores: Vec<f64>,
    pub budget_used_percent: f64,
}

/// Embedding cache, vector-search delegation, ranking, relationship
/// expansion, and budgeted template formatting — the context engine of
/// spec §4.8, tied to one workspace-agnostic embedding/storage pair.
pub struct ContextEngine {
    embedding: Arc<dyn EmbeddingProvider>,
    storage: Arc<dyn StorageClient>,
    counter: Arc<TokenCounter>,
    embedding_cache: EmbeddingCache,
    pub rankers: RankerRegistry,
    pub templates: TemplateRegistry,
    config: ContextConfig,
}

impl ContextEngine {
    pub fn new(
        embedding: Arc<dyn EmbeddingProvider>,
        storage: Arc<dyn StorageClient>,
        counter: Arc<TokenCounter>,
        config: ContextConfig,
    ) -> Self {
        let embedding_cache =
            EmbeddingCache::new(config.cache_config.max_entries, std::time::Duration::from_secs(config.cache_config.ttl_seconds));
        Self {
            embedding,
            storage,
            counter,
            embedding_cache,
            rankers: RankerRegistry::with_builtins(),
            templates: TemplateRegistry::with_builtins(),
            config,
        }
    }

    fn expected_dimensions(&self) -> usize {
        self.config.expected_embedding_dimensions.unwrap_or_else(|| self.embedding.dimensions())
    }

    /// Embeds `text` (cache keyed `(model, blake3(text))`), delegates vector
    /// search to storage, applies client-side filters, and optionally
    /// expands by relationship.
    pub async fn search(
        &self,
        query_text: &str,
        workspace_id: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        debug!(
            query = %truncate_for_log(query_text, QUERY_LOG_TRUNCATE_CHARS),
            workspace_id,
            "context engine search"
        );
        let vector = self.embed(query_text).await?;
        self.search_core(&vector, workspace_id, options).await
    }

    /// Same as `search` but skips embedding: validates `vector`'s length
    /// against the provider's dimensions and that every entry is finite.
    pub async fn search_by_vector(
        &self,
        vector: &[f32],
        workspace_id: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        validate_vector(vector, self.expected_dimensions())?;
        self.search_core(vector, workspace_id, options).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let model = self.embedding.model().to_string();
        if let Some(cached) = self.embedding_cache.get(&model, text) {
            return Ok(cached);
        }
        let vector = self.embedding.embed(text).await?;
        self.embedding_cache.insert(&model, text, vector.clone());
        Ok(vector)
    }

    async fn search_core(
        &self,
        vector: &[f32],
        workspace_id: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let filters = SearchFilters {
            limit: options.limit,
            types: options.types.clone(),
            date_from: options.date_from,
            date_to: options.date_to,
        };
        let scored = self
            .storage
            .search_memories(workspace_id, vector, &filters)
            .await
            .map_err(|err| RetrievalError::StorageError(err.to_string()))?;

        let mut results: Vec<SearchResult> = scored
            .into_iter()
            .filter(|scored| passes_client_filters(&scored.memory, options))
            .map(|scored| SearchResult { memory: scored.memory, score: scored.score, expansion: None })
            .collect();

        if let Some(depth) = options.expand_relationships_depth {
            let expanded = expand(self.storage.as_ref(), workspace_id, &results, depth).await?;
            results.extend(expanded);
        }

        Ok(results)
    }

    fn rank(&self, results: &[SearchResult], ranker_name: &str) -> Result<Vec<RankedResult>, RetrievalError> {
        self.rankers.rank(ranker_name, results)
    }

    /// Runs `search`, ranks, then formats into a single string under
    /// `budget` using the named template.
    pub async fn build_context(
        &self,
        query_text: &str,
        workspace_id: &str,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<ContextResult, RetrievalError> {
        let results = self.search(query_text, workspace_id, options).await?;
        self.finish_build(results, options, template_name, budget).await
    }

    pub async fn build_context_by_vector(
        &self,
        vector: &[f32],
        workspace_id: &str,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<ContextResult, RetrievalError> {
        let results = self.search_by_vector(vector, workspace_id, options).await?;
        self.finish_build(results, options, template_name, budget).await
    }

    async fn finish_build(
        &self,
        results: Vec<SearchResult>,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<ContextResult, RetrievalError> {
        let ranker_name = options.ranker.as_deref().unwrap_or("default");
        let ranked = self.rank(&results, ranker_name)?;
        let template = self.templates.get(template_name)?;
        let formatted = format_context(&template, &ranked, &self.counter, self.config.token_count_method, budget);
        let memories = memories_for(&ranked, &formatted.included_memory_ids);
        Ok(ContextResult {
            text: formatted.text,
            memories,
            token_count: formatted.token_count,
            truncated: formatted.truncated,
        })
    }

    /// Same as `build_context` plus ranking/budget diagnostics.
    pub async fn preview_context(
        &self,
        query_text: &str,
        workspace_id: &str,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<PreviewResult, RetrievalError> {
        let results = self.search(query_text, workspace_id, options).await?;
        self.finish_preview(results, options, template_name, budget).await
    }

    pub async fn preview_context_by_vector(
        &self,
        vector: &[f32],
        workspace_id: &str,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<PreviewResult, RetrievalError> {
        let results = self.search_by_vector(vector, workspace_id, options).await?;
        self.finish_preview(results, options, template_name, budget).await
    }

    async fn finish_preview(
        &self,
        results: Vec<SearchResult>,
        options: &SearchOptions,
        template_name: &str,
        budget: usize,
    ) -> Result<PreviewResult, RetrievalError> {
        let ranker_name = options.ranker.as_deref().unwrap_or("default");
        let ranked = self.rank(&results, ranker_name)?;
        let template = self.templates.get(template_name)?;
        let formatted = format_context(&template, &ranked, &self.counter, self.config.token_count_method, budget);
        let memories = memories_for(&ranked, &formatted.included_memory_ids);
        let ranking_scores = ranked.iter().map(|r| r.ranking_score).collect();
        Ok(PreviewResult {
            text: formatted.text,
            memories,
            token_count: formatted.token_count,
            truncated: formatted.truncated,
            memory_ids: formatted.included_memory_ids.clone(),
            ranking_scores,
            budget_used_percent: formatted.budget_used_percent(budget),
        })
    }
}

fn passes_client_filters(memory: &ExtractedMemory, options: &SearchOptions) -> bool {
    if let Some(min_confidence) = options.min_confidence {
        if memory.confidence < min_confidence {
            return false;
        }
    }
    if let Some(conversation_id) = &options.conversation_id {
        if &memory.conversation_id != conversation_id {
            return false;
        }
    }
    true
}

fn memories_for(ranked: &[RankedResult], included_ids: &[String]) -> Vec<ExtractedMemory> {
    let by_id: std::collections::HashMap<&str, &ExtractedMemory> =
        ranked.iter().map(|r| (r.result.memory.id.as_str(), &r.result.memory)).collect();
    included_ids.iter().filter_map(|id| by_id.get(id.as_str()).map(|m| (*m).clone())).collect()
}
