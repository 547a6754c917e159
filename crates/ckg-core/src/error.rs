//! Core error types for CKG.

use ckg_indexer::IndexerError;
use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Indexing or store failure
    #[error(transparent)]
    Indexer(#[from] IndexerError),
}
