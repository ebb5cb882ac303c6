/// Errors from the deduplication / merge stage. Individual bad records never
/// panic this subsystem — these are reserved for input shapes that make
/// merging impossible to reason about at all (e.g. a relationship pointing
/// into a different dedup run).
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("memory {0} referenced by merged_from but absent from the input set")]
    DanglingMergeSource(String),

    #[error("relationship endpoints span workspaces: {from_workspace} vs {to_workspace}")]
    CrossWorkspaceRelationship {
        from_workspace: String,
        to_workspace: String,
    },
}
