/// Errors surfaced by the `StorageClient` seam (§6). `memloom` never
/// implements a persistence engine; this enum only carries what a caller's
/// implementation reports back across the trait boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("workspace mismatch: memory belongs to a different workspace")]
    WorkspaceMismatch,

    #[error("not found: {0}")]
    NotFound(String),
}
