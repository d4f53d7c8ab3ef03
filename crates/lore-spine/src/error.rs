//! Spine error types.

use lore_storage::StorageError;

/// Failures that abort a spine build or load.
///
/// Data-quality problems (dangling parents, malformed cache records) are not
/// errors; they only remove nodes from navigation.
#[derive(Debug, thiserror::Error)]
pub enum SpineError {
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The project does not exist.
    #[error("Project {0} not found")]
    UnitNotFound(i64),

    /// The spine could not be encoded for storage.
    #[error("Failed to encode spine: {0}")]
    Encode(#[from] serde_json::Error),
}
