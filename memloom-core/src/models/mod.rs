mod chunk;
mod chunk_result;
mod conversation;
mod detection;
mod memory;
mod message;
mod relationship;
mod role;
mod token;

pub use chunk::{Chunk, ChunkContext};
pub use chunk_result::{ChunkResult, ChunkResultError, ChunkStatus};
pub use conversation::NormalizedConversation;
pub use detection::{DetectionConfidence, DetectionResult};
pub use memory::{content_hash_id, normalize_content, ExtractedMemory};
pub use message::NormalizedMessage;
pub use relationship::ExtractedRelationship;
pub use role::Role;
pub use token::{TokenAccuracy, TokenCount, TokenCountMethod};
