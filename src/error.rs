//! Error types for typemaster.

use thiserror::Error;

/// Main error type for typemaster operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A session could not be started with the given arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The SQLite-backed store failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored or exported document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the backing store itself failed (database or
    /// filesystem), as opposed to a document that could not be decoded.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
