//! Connection struct and open/close logic
//!
//! A Connection wraps one opened storage engine and exposes bucket-scoped
//! get/put/delete/delete_bucket. It is always handed out as `Arc<Connection>`
//! and shared by every caller that opens the same path.
//!
//! ## Locking
//!
//! - Reads only take the engine slot's shared lock and rely on the engine's
//!   snapshot isolation, so they run concurrently with each other and with a
//!   write in flight.
//! - Writes (put, delete, delete_bucket) serialize on the connection's write
//!   mutex for the whole transaction.
//! - Close takes the engine slot's exclusive lock, which waits for in-flight
//!   operations, then releases the engine.

mod builder;
pub mod registry;

pub use builder::ConnectionBuilder;
pub use registry::{global, registry_key, Registry};

use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bucketkv_core::{BucketWrite, EngineError, EngineResult, Error, Result, StorageEngine};
use bucketkv_storage::{RedbConfig, RedbEngine};
use tracing::{debug, info};

// ============================================================================
// Connection Struct
// ============================================================================

/// Shared handle to one opened storage file
///
/// Create one with [`Connection::open`]. Opening a path that already has a
/// live connection returns that same `Arc`:
///
/// ```ignore
/// use bucketkv_engine::Connection;
/// use std::sync::Arc;
///
/// let a = Connection::open("data.redb")?;
/// let b = Connection::open("data.redb")?;
/// assert!(Arc::ptr_eq(&a, &b));
///
/// a.put(b"users", b"1", b"Alice")?;
/// assert_eq!(b.get(b"users", b"1")?, b"Alice");
///
/// a.close()?;
/// // `b` is the same retired instance; open again for a fresh one
/// let c = Connection::open("data.redb")?;
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct Connection<E: StorageEngine = RedbEngine> {
    /// Registry key of the storage file
    path: PathBuf,

    /// The opened engine; `None` once the connection is closed
    engine: RwLock<Option<E>>,

    /// Serializes write transactions issued through this connection
    write_lock: Mutex<()>,

    /// Set as the first step of close; retired connections are never
    /// returned by the registry
    closed: AtomicBool,

    /// Registry this connection was opened through
    registry: Weak<Registry<E>>,
}

impl Connection<RedbEngine> {
    /// Open the storage file at `path` with default options
    ///
    /// Uses the process-wide registry: if a connection for `path` is already
    /// open it is returned, otherwise the file is opened (created if absent)
    /// and the new connection is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] if the engine cannot open the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        Self::open_in(&registry::global(), path, &RedbConfig::default())
    }

    /// Builder for opening with custom options or registry
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }
}

impl<E: StorageEngine> Connection<E> {
    /// Open `path` through `registry` with explicit engine options
    ///
    /// # Thread Safety
    ///
    /// Concurrent opens of the same path through the same registry serialize
    /// on a per-path gate: exactly one of them opens the engine, the others
    /// receive its connection. Options only apply when the engine is actually
    /// opened; an already registered connection is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] if the engine cannot open the file.
    pub fn open_in<P: AsRef<Path>>(
        registry: &Arc<Registry<E>>,
        path: P,
        options: &E::Options,
    ) -> Result<Arc<Self>> {
        let key = registry_key(path.as_ref());

        if let Some(existing) = registry.lookup_key(&key) {
            debug!(target: "bucketkv::connection", path = ?key, "Returning existing connection");
            return Ok(existing);
        }

        let gate = registry.open_gate(&key);
        let result = {
            let _opening = gate.lock();
            Self::open_gated(registry, &key, options)
        };
        registry.release_gate(&key, gate);
        result
    }

    fn open_gated(registry: &Arc<Registry<E>>, key: &Path, options: &E::Options) -> Result<Arc<Self>> {
        // Another thread may have finished opening while we waited on the gate
        if let Some(existing) = registry.lookup_key(key) {
            debug!(target: "bucketkv::connection", path = ?key, "Returning existing connection");
            return Ok(existing);
        }

        let engine = E::open(key, options).map_err(|source| Error::OpenFailed {
            path: key.to_path_buf(),
            source,
        })?;

        let connection = Arc::new(Self {
            path: key.to_path_buf(),
            engine: RwLock::new(Some(engine)),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            registry: Arc::downgrade(registry),
        });

        let winner = registry
            .insert(Arc::clone(&connection))
            .unwrap_or_else(|| Arc::clone(&connection));
        if !Arc::ptr_eq(&winner, &connection) {
            // Registered by another route in the meantime: keep theirs, drop ours
            if let Err(e) = connection.close() {
                debug!(target: "bucketkv::connection", path = ?key, error = %e, "Discarded duplicate engine handle");
            }
            return Ok(winner);
        }

        info!(target: "bucketkv::connection", path = ?key, "Opened connection");
        Ok(connection)
    }

    /// Registry key of the storage file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Read the value stored under `key` in `bucket`
    ///
    /// Runs in one read-only transaction and returns an owned copy.
    ///
    /// # Errors
    ///
    /// - [`Error::BucketNotFound`] if the bucket does not exist
    /// - [`Error::KeyNotFound`] if the bucket exists but the key does not
    /// - [`Error::ReadFailed`] if the engine fails to read
    /// - [`Error::Closed`] if the connection was closed
    pub fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        let slot = self.engine.read();
        let engine = slot.as_ref().ok_or_else(|| self.closed_error())?;

        match engine.read(|tx| tx.get(bucket, key)) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(Error::KeyNotFound),
            Err(EngineError::BucketMissing) => Err(Error::BucketNotFound),
            Err(e) => Err(Error::ReadFailed(e)),
        }
    }

    /// Store `value` under `key` in `bucket`, creating the bucket if needed
    ///
    /// Overwrites any existing value. Returns once the transaction commits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if the transaction cannot commit; nothing
    /// is applied in that case.
    pub fn put(&self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        self.write(|tx| tx.put(bucket, key, value))
    }

    /// Remove `key` from `bucket`
    ///
    /// Succeeds without changes when the bucket or the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if the transaction cannot commit.
    pub fn delete(&self, bucket: &[u8], key: &[u8]) -> Result<()> {
        self.write(|tx| match tx.delete(bucket, key) {
            Ok(_) | Err(EngineError::BucketMissing) => Ok(()),
            Err(e) => Err(e),
        })
    }

    /// Remove `bucket` and all of its entries in one transaction
    ///
    /// # Errors
    ///
    /// - [`Error::BucketNotFound`] if the bucket does not exist
    /// - [`Error::WriteFailed`] if the transaction cannot commit
    pub fn delete_bucket(&self, bucket: &[u8]) -> Result<()> {
        self.write(|tx| tx.delete_bucket(bucket))
    }

    /// Unregister this connection and release the engine
    ///
    /// The connection leaves the registry even when releasing the engine
    /// fails. Closing an already closed connection does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CloseFailed`] if the engine fails to release.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self);
        }

        // Waits for in-flight reads and writes to finish
        let engine = self.engine.write().take();
        if let Some(engine) = engine {
            engine.close().map_err(Error::CloseFailed)?;
        }

        info!(target: "bucketkv::connection", path = ?self.path, "Closed connection");
        Ok(())
    }

    fn write<T>(&self, f: impl FnOnce(&mut dyn BucketWrite) -> EngineResult<T>) -> Result<T> {
        let _writer = self.write_lock.lock();
        let slot = self.engine.read();
        let engine = slot.as_ref().ok_or_else(|| self.closed_error())?;

        engine.write(f).map_err(|e| match e {
            EngineError::BucketMissing => Error::BucketNotFound,
            other => Error::WriteFailed(other),
        })
    }

    fn closed_error(&self) -> Error {
        Error::Closed {
            path: self.path.clone(),
        }
    }
}

impl<E: StorageEngine> std::fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
