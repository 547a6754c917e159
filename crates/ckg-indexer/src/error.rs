//! Indexer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during indexing and store operations.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or visit a file
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Path not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Invalid language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A built-in scan pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl IndexerError {
    /// Shorthand for a parse error attributed to `path`.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IndexerError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(e: serde_json::Error) -> Self {
        IndexerError::Serialization(e.to_string())
    }
}

impl From<rusqlite::Error> for IndexerError {
    fn from(e: rusqlite::Error) -> Self {
        IndexerError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexerError::NotFound(PathBuf::from("/test/path"));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IndexerError = io_err.into();
        assert!(matches!(err, IndexerError::Io(_)));
    }

    #[test]
    fn test_sqlite_error_becomes_storage() {
        let err: IndexerError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, IndexerError::Storage(_)));
    }

    #[test]
    fn test_parse_shorthand() {
        let err = IndexerError::parse("/src/a.py", "no tree");
        assert_eq!(err.to_string(), "Parse error in /src/a.py: no tree");
    }
}
