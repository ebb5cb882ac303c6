//! Golden JSON fixtures shared across the workspace's integration tests,
//! mirroring the teacher crate's dedicated fixtures crate.

use std::path::{Path, PathBuf};

use serde_json::Value;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Loads a fixture file by name (relative to the `fixtures/` directory,
/// e.g. `"dedup/merge_three_memories.json"`) and parses it as JSON.
pub fn load_json(relative_path: &str) -> Value {
    let path = fixtures_dir().join(relative_path);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|err| panic!("failed to parse fixture {}: {err}", path.display()))
}

/// Loads a fixture file as raw bytes, for parser-registry round trips that
/// exercise `detect_and_parse`'s JSON-decode step directly.
pub fn load_bytes(relative_path: &str) -> Vec<u8> {
    let path = fixtures_dir().join(relative_path);
    std::fs::read(&path).unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()))
}

pub mod names {
    pub const SIMPLE_CONVERSATION: &str = "parsers/simple_conversation.json";
    pub const BUNDLE_CONVERSATION: &str = "parsers/bundle_conversations.json";
    pub const TREE_CONVERSATION: &str = "parsers/tree_conversation.json";
    pub const DEDUP_MERGE_THREE: &str = "dedup/merge_three_memories.json";
    pub const DEDUP_RELATIONSHIP_REWIRE: &str = "dedup/relationship_rewiring.json";
    pub const CONTEXT_BUDGET: &str = "context/budget_truncation.json";
}
