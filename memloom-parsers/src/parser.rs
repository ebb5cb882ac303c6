use serde_json::Value;

use memloom_core::errors::ParseError;
use memloom_core::models::NormalizedConversation;

/// Successful parse output, possibly partial when `strict` is false.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub conversations: Vec<NormalizedConversation>,
    pub errors: Vec<ParseErrorRecord>,
}

/// A per-conversation failure recorded in non-strict mode.
#[derive(Debug, Clone)]
pub struct ParseErrorRecord {
    pub index: usize,
    pub message: String,
}

/// A provider-keyed parser capability: `{name, canParse, do}` per the
/// registry design note (spec §9) — a capability set, not an inheritance
/// chain.
pub trait Parser: Send + Sync {
    /// Stable, lowercase provider key this parser is registered under.
    fn name(&self) -> &str;

    /// Cheap, infallible structural check — never deep-validates.
    fn can_parse(&self, raw: &Value) -> bool;

    /// Parses `raw` into normalized conversations.
    ///
    /// `strict` controls per-conversation error handling for multi-
    /// conversation bundles: in strict mode the first per-conversation
    /// failure aborts with `Err`; in non-strict mode failures are collected
    /// into `ParseOutcome::errors` alongside whatever succeeded.
    fn parse(&self, raw: &Value, strict: bool) -> Result<ParseOutcome, ParseError>;
}
