use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failed operation.
        message: String,
        /// Backend specific failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The stored version no longer matches the version the caller read.
    #[error("game `{id}` was modified concurrently (expected version {expected})")]
    Conflict {
        /// Identifier of the contended game.
        id: Uuid,
        /// Version the caller expected to find in storage.
        expected: i32,
    },
    /// Another game already uses this name.
    #[error("game name `{name}` is already taken")]
    Duplicate {
        /// Name rejected by the unique constraint.
        name: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a concurrency conflict for the given game and expected version.
    pub fn conflict(id: Uuid, expected: i32) -> Self {
        StorageError::Conflict { id, expected }
    }

    /// Construct a duplicate-name error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        StorageError::Duplicate { name: name.into() }
    }
}
