//! Record store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}
