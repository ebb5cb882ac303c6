//! Prompt/schema construction and response mapping for per-chunk LLM
//! extraction of memories and relationships.

mod prompt;
mod schema;
mod strategy;

#[cfg(feature = "testing")]
pub mod testing;

pub use prompt::build_prompt;
pub use schema::build_json_schema;
pub use strategy::ExtractionStrategy;
