//! Error types for bucketkv
//!
//! Two layers of errors live here:
//! - [`EngineError`]: what a storage engine reports from inside a transaction
//! - [`Error`]: what a caller of a connection sees
//!
//! Every caller-facing kind is its own variant, so classification dispatches on
//! the variant and never on message text. We use `thiserror` for the `Display`
//! and `Error` implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors reported by a storage engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The named bucket does not exist in the transaction's view
    #[error("bucket does not exist")]
    BucketMissing,

    /// The storage file is already held open by another handle
    #[error("storage file is locked by another handle")]
    Locked,

    /// I/O error while touching the storage file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Any other backend failure (corruption, capacity, transaction errors)
    #[error("{0}")]
    Backend(String),
}

impl EngineError {
    /// Wrap a backend error by its message
    pub fn backend(err: impl std::fmt::Display) -> Self {
        EngineError::Backend(err.to_string())
    }
}

/// Caller-facing error kinds
#[derive(Debug, Error)]
pub enum Error {
    /// The engine could not open or create the storage file
    #[error("failed to open {}: {source}", path.display())]
    OpenFailed {
        /// Path that was being opened
        path: PathBuf,
        /// Engine failure, propagated verbatim
        #[source]
        source: EngineError,
    },

    /// A read or delete-bucket targeted a bucket that does not exist
    #[error("bucket not found")]
    BucketNotFound,

    /// A read targeted a key absent from an existing bucket
    #[error("key not found")]
    KeyNotFound,

    /// The engine failed to run a read transaction
    #[error("read failed: {0}")]
    ReadFailed(#[source] EngineError),

    /// The engine failed to commit a write transaction; nothing was applied
    #[error("write failed: {0}")]
    WriteFailed(#[source] EngineError),

    /// The engine failed to release its resources
    #[error("close failed: {0}")]
    CloseFailed(#[source] EngineError),

    /// The connection was already closed
    #[error("connection to {} is closed", path.display())]
    Closed {
        /// Path of the retired connection
        path: PathBuf,
    },

    /// Invalid configuration or builder usage
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True exactly for [`Error::BucketNotFound`] and [`Error::KeyNotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::BucketNotFound | Error::KeyNotFound)
    }

    /// Build an [`Error::InvalidConfig`]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

/// Free-standing form of [`Error::is_not_found`]
pub fn is_not_found(err: &Error) -> bool {
    err.is_not_found()
}
