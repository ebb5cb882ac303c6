//! Token counting across exact-BPE, provider estimates, and a universal
//! char-divide fallback, with a bounded LRU+TTL cache shared across callers.

mod counter;

pub use counter::TokenCounter;
