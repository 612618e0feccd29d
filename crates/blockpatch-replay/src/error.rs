//! Error types for the replay crate.

/// Errors that can occur while applying a patch set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// A delete, move, or update targets a block that does not exist.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An insert or move targets a parent that does not exist.
    #[error("unknown parent {parent} for node {node}")]
    UnknownParent { node: String, parent: String },

    /// An insert reuses an id already present.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// No anchor of a pending insert or move could be resolved.
    #[error("unresolved anchors for node {node} (after {after_id:?}, before {before_id:?})")]
    UnresolvedAnchor {
        node: String,
        after_id: Option<String>,
        before_id: Option<String>,
    },
}

/// Convenience alias for replay results.
pub type ReplayResult<T> = Result<T, ReplayError>;
