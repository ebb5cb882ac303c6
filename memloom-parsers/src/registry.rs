use std::sync::RwLock;

use serde_json::Value;
use tracing::warn;

use memloom_core::errors::ParseError;
use memloom_core::models::{DetectionConfidence, DetectionResult};

use crate::detection::detect_structural;
use crate::parser::{ParseOutcome, Parser};

/// Maps a normalized provider key (lowercased, trimmed) to a `Parser`.
/// Populated at construction; mutated only through `register`, which
/// serializes with a write lock and logs overwrites (spec §5, §9's custom-
/// registration open question: re-registering replaces, with a warning).
pub struct ParserRegistry {
    parsers: RwLock<Vec<(String, Box<dyn Parser>)>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: RwLock::new(Vec::new()),
        }
    }

    /// Registers the three built-in parsers (§4.2's provider shapes) in a
    /// fixed, deterministic order: bundle, tree, then simple. Order matters
    /// for auto-detection's "ask each registered parser in registration
    /// order" fallback.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Box::new(crate::parsers::BundleParser));
        registry.register(Box::new(crate::parsers::TreeParser));
        registry.register(Box::new(crate::parsers::SimpleParser));
        registry
    }

    fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Registers `parser` under its own `name()`, normalized. Overwrites any
    /// existing registration for that key, logging a warning when it does.
    pub fn register(&self, parser: Box<dyn Parser>) {
        let key = Self::normalize_key(parser.name());
        let mut parsers = self.parsers.write().expect("parser registry lock poisoned");
        if let Some(existing) = parsers.iter_mut().find(|(existing_key, _)| *existing_key == key) {
            warn!(provider = %key, "overwriting existing parser registration");
            existing.1 = parser;
        } else {
            parsers.push((key, parser));
        }
    }

    pub fn get(&self, provider: &str) -> Option<()> {
        let key = Self::normalize_key(provider);
        let parsers = self.parsers.read().expect("parser registry lock poisoned");
        parsers.iter().any(|(existing_key, _)| *existing_key == key).then_some(())
    }

    /// Parses `raw` using the parser registered under `provider`.
    pub fn parse_with(&self, provider: &str, raw: &Value, strict: bool) -> Result<ParseOutcome, ParseError> {
        let key = Self::normalize_key(provider);
        let parsers = self.parsers.read().expect("parser registry lock poisoned");
        let (_, parser) = parsers
            .iter()
            .find(|(existing_key, _)| *existing_key == key)
            .ok_or_else(|| ParseError::ProviderNotFound(provider.to_string()))?;
        parser.parse(raw, strict)
    }

    /// Structural-pattern-first, then registration-order `canParse` fallback
    /// auto-detection (§4.2). Returns the chosen provider key with a
    /// confidence tier; does not itself run the parse.
    pub fn detect(&self, raw: &Value) -> Result<DetectionResult, ParseError> {
        let structural = detect_structural(raw);
        let parsers = self.parsers.read().expect("parser registry lock poisoned");

        if let Some((provider, patterns)) = &structural {
            let registered_agrees = parsers
                .iter()
                .any(|(key, parser)| key == provider && parser.can_parse(raw));
            if registered_agrees {
                return Ok(DetectionResult {
                    provider: provider.to_string(),
                    confidence: DetectionConfidence::High,
                    matched_patterns: patterns.iter().map(|p| p.to_string()).collect(),
                });
            }
            if parsers.iter().any(|(key, _)| key == provider) {
                return Ok(DetectionResult {
                    provider: provider.to_string(),
                    confidence: DetectionConfidence::Medium,
                    matched_patterns: patterns.iter().map(|p| p.to_string()).collect(),
                });
            }
        }

        for (key, parser) in parsers.iter() {
            if parser.can_parse(raw) {
                return Ok(DetectionResult {
                    provider: key.clone(),
                    confidence: DetectionConfidence::Low,
                    matched_patterns: Vec::new(),
                });
            }
        }

        Err(ParseError::DetectionFailed)
    }

    /// Decodes `bytes` as JSON, then auto-detects and parses. Non-JSON input
    /// fails detection per §4.2.
    pub fn detect_and_parse(&self, bytes: &[u8], strict: bool) -> Result<(DetectionResult, ParseOutcome), ParseError> {
        let raw: Value = serde_json::from_slice(bytes)
            .map_err(|err| ParseError::NotJson(err.to_string()))?;
        let detection = self.detect(&raw)?;
        let outcome = self.parse_with(&detection.provider, &raw, strict)?;
        Ok((detection, outcome))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
