use std::collections::HashMap;
use std::sync::RwLock;

use tracing::warn;

use memloom_core::config::ChunkingConfig;
use memloom_core::errors::ChunkingError;
use memloom_core::models::{Chunk, NormalizedConversation};
use memloom_tokens::TokenCounter;

/// A chunking algorithm: `{name, canHandle, chunk}` per spec §9's capability-
/// set design note — no inheritance chain, strategies hold `ChunkingBase`
/// rather than extend it.
pub trait ChunkingStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Rejects conversations this strategy fundamentally cannot chunk (e.g. a
    /// single message that alone exceeds `max_tokens_per_chunk`). Chunking-
    /// level inability to handle is fatal, never a silent drop (spec §7).
    fn can_handle(
        &self,
        conversation: &NormalizedConversation,
        config: &ChunkingConfig,
        counter: &TokenCounter,
    ) -> Result<(), String>;

    fn chunk(
        &self,
        conversation: &NormalizedConversation,
        config: &ChunkingConfig,
        counter: &TokenCounter,
    ) -> Result<Vec<Chunk>, ChunkingError>;
}

/// Populated at construction (the three built-ins), read-only afterwards
/// unless an explicit `register` call is made. Overwriting a previously
/// registered (necessarily custom, since built-ins aren't user-addressable by
/// the same keys without an explicit call) strategy replaces it and logs a
/// warning — spec §9's open question is resolved as replace-with-warn.
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<String, Box<dyn ChunkingStrategy>>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("sliding-window", Box::new(crate::sliding_window::SlidingWindowStrategy));
        registry.register("boundary", Box::new(crate::boundary::BoundaryStrategy));
        registry.register("semantic", Box::new(crate::semantic::SemanticStrategy));
        registry
    }

    pub fn register(&self, name: &str, strategy: Box<dyn ChunkingStrategy>) {
        let mut strategies = self.strategies.write().expect("strategy registry lock poisoned");
        if strategies.contains_key(name) {
            warn!(strategy = %name, "overwriting existing chunking strategy registration");
        }
        strategies.insert(name.to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Result<(), ChunkingError> {
        let strategies = self.strategies.read().expect("strategy registry lock poisoned");
        if strategies.contains_key(name) {
            Ok(())
        } else {
            Err(ChunkingError::StrategyNotFound(name.to_string()))
        }
    }

    /// Looks up `name`, checks it can handle `conversation`, and runs it.
    pub fn chunk_with(
        &self,
        name: &str,
        conversation: &NormalizedConversation,
        config: &ChunkingConfig,
        counter: &TokenCounter,
    ) -> Result<Vec<Chunk>, ChunkingError> {
        let strategies = self.strategies.read().expect("strategy registry lock poisoned");
        let strategy = strategies
            .get(name)
            .ok_or_else(|| ChunkingError::StrategyNotFound(name.to_string()))?;
        if let Err(reason) = strategy.can_handle(conversation, config, counter) {
            return Err(ChunkingError::StrategyCannotHandle {
                strategy: name.to_string(),
                conversation_id: conversation.id.clone(),
                reason,
            });
        }
        strategy.chunk(conversation, config, counter)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
