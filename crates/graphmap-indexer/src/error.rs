//! Indexer error types.

use thiserror::Error;

/// Errors that can occur while reading the vault or writing index files.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found in the vault
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Create target already exists
    #[error("Path already exists: {0}")]
    AlreadyExists(String),

    /// Expected a file but found a folder
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Path escapes the vault or is not valid UTF-8
    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<tokio::task::JoinError> for IndexerError {
    fn from(e: tokio::task::JoinError) -> Self {
        IndexerError::Storage(e.to_string())
    }
}
