//! CLI error types.

use lore_config::ConfigError;
use lore_spine::SpineError;
use lore_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Spine(#[from] SpineError),

    #[error("{0}")]
    Validation(String),
}
