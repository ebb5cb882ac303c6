//! Provider-agnostic parsing of conversation exports into
//! `NormalizedConversation`s, plus structural-pattern auto-detection.

mod detection;
mod parser;
pub mod parsers;
mod registry;
mod support;

pub use detection::{detect_structural, StructuralPattern};
pub use parser::{ParseErrorRecord, ParseOutcome, Parser};
pub use registry::ParserRegistry;
pub use support::{is_droppable_content, map_role, parse_timestamp, preserve_unknown_fields};
