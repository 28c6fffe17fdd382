//! Engine boundary traits
//!
//! A connection never touches pages, files or locks itself. It talks to a
//! [`StorageEngine`] through three operations (open, one read transaction, one
//! write transaction) and releases it with `close`. Swapping the engine does not
//! change connection semantics as long as the implementation honors the
//! contracts below.

use std::fmt::Debug;
use std::path::Path;

use crate::error::EngineResult;

/// An embedded, transactional, bucketed key-value engine
///
/// Thread safety: `read` and `write` may be called concurrently from multiple
/// threads. Readers must observe a consistent snapshot: either everything a
/// concurrent write transaction did, or none of it.
pub trait StorageEngine: Send + Sync + Sized + 'static {
    /// Engine-specific open options
    type Options: Clone + Debug + Default + Send + Sync;

    /// Open (or create) the storage file at `path`
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Locked`](crate::EngineError::Locked) if the file is
    /// already held by another handle, or any I/O / backend failure.
    fn open(path: &Path, options: &Self::Options) -> EngineResult<Self>;

    /// Run `f` inside one read-only transaction
    fn read<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&dyn BucketRead) -> EngineResult<T>;

    /// Run `f` inside one write transaction
    ///
    /// Commits when `f` returns `Ok` and the commit succeeds. When `f` returns
    /// `Err`, or the commit fails, none of the transaction's effects are visible.
    fn write<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn BucketWrite) -> EngineResult<T>;

    /// Release the engine handle
    ///
    /// Consumes the engine, so a handle is released at most once.
    fn close(self) -> EngineResult<()>;
}

/// Read access to buckets within one transaction
pub trait BucketRead {
    /// Look up `key` in `bucket`
    ///
    /// Returns an owned copy of the value, valid after the transaction ends.
    /// Fails with [`EngineError::BucketMissing`](crate::EngineError::BucketMissing)
    /// when the bucket does not exist; `Ok(None)` means the bucket exists but the
    /// key does not.
    fn get(&self, bucket: &[u8], key: &[u8]) -> EngineResult<Option<Vec<u8>>>;
}

/// Write access to buckets within one transaction
pub trait BucketWrite {
    /// Create `bucket` if needed, then insert or overwrite `key`
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Remove `key` from `bucket`, returning whether it was present
    ///
    /// Fails with [`EngineError::BucketMissing`](crate::EngineError::BucketMissing)
    /// when the bucket does not exist.
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> EngineResult<bool>;

    /// Remove `bucket` and every entry in it
    ///
    /// Fails with [`EngineError::BucketMissing`](crate::EngineError::BucketMissing)
    /// when the bucket does not exist.
    fn delete_bucket(&mut self, bucket: &[u8]) -> EngineResult<()>;
}
