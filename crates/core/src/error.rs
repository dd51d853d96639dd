//! Errors raised by credential storage

use std::path::{Path, PathBuf};

/// Standard result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Reading or writing persisted credentials failed
    #[error("Credential storage failed: {message}")]
    Io { message: String },

    /// The credentials file exists but is not a JSON object of strings
    #[error("Credential file {} is corrupt: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A writer panicked while holding the store lock
    #[error("Token store lock poisoned")]
    Poisoned,
}

impl CoreError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn corrupt(path: &Path, err: &serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
