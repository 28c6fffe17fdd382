//! Redb storage engine implementation.
//!
//! This module provides the `RedbEngine` type which implements the
//! `StorageEngine` trait using the redb embedded database.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use bucketkv_core::{BucketRead, BucketWrite, EngineError, EngineResult, StorageEngine};
use redb::{Database, DatabaseError};
use tracing::debug;

use crate::config::RedbConfig;
use crate::transaction::{RedbReader, RedbWriter};

/// A storage engine backed by one redb file.
///
/// The file stays exclusively locked while the engine is alive; opening the
/// same file again, from this process or another one, fails with
/// [`EngineError::Locked`] until the engine is closed.
///
/// # Example
///
/// ```ignore
/// use bucketkv_core::StorageEngine;
/// use bucketkv_storage::{RedbConfig, RedbEngine};
///
/// let engine = RedbEngine::open(Path::new("data.redb"), &RedbConfig::default())?;
/// engine.write(|tx| tx.put(b"users", b"1", b"Alice"))?;
/// let name = engine.read(|tx| tx.get(b"users", b"1"))?;
/// engine.close()?;
/// ```
pub struct RedbEngine {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine").field("path", &self.path).finish_non_exhaustive()
    }
}

impl RedbEngine {
    /// Path of the storage file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageEngine for RedbEngine {
    type Options = RedbConfig;

    fn open(path: &Path, options: &RedbConfig) -> EngineResult<Self> {
        let file = open_storage_file(path, options.file_mode)?;

        let mut builder = Database::builder();
        if let Some(cache_size) = options.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = builder.create_file(file).map_err(open_error)?;

        debug!(target: "bucketkv::storage", path = %path.display(), "Opened storage file");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    fn read<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&dyn BucketRead) -> EngineResult<T>,
    {
        let tx = self.db.begin_read().map_err(EngineError::backend)?;
        let reader = RedbReader::new(tx);
        f(&reader)
    }

    fn write<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn BucketWrite) -> EngineResult<T>,
    {
        let tx = self.db.begin_write().map_err(EngineError::backend)?;
        let mut writer = RedbWriter::new(tx);
        match f(&mut writer) {
            Ok(value) => {
                writer.commit()?;
                Ok(value)
            }
            Err(e) => {
                writer.abort();
                Err(e)
            }
        }
    }

    fn close(self) -> EngineResult<()> {
        let RedbEngine { db, path } = self;
        // redb flushes on every commit; dropping the handle releases the file lock
        drop(db);
        debug!(target: "bucketkv::storage", path = %path.display(), "Closed storage file");
        Ok(())
    }
}

/// Open or create the storage file without truncating it
fn open_storage_file(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

fn open_error(err: DatabaseError) -> EngineError {
    match err {
        DatabaseError::DatabaseAlreadyOpen => EngineError::Locked,
        DatabaseError::Storage(redb::StorageError::Io(e)) => EngineError::Io(e),
        other => EngineError::backend(other),
    }
}
