//! Core error types for GraphMap.

use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Setting name not recognised
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// Setting value rejected
    #[error("Invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },
}

impl From<serde_yaml::Error> for CoreError {
    fn from(e: serde_yaml::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
