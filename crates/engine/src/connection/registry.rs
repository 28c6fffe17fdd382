//! Connection registry for singleton management
//!
//! Ensures at most one live Connection exists per storage file path.
//! A registry is an ordinary value: tests and embedders can create their own
//! with [`Registry::new`], while [`Connection::open`] uses the lazily
//! initialized process-wide instance returned by [`global`].

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bucketkv_core::{Error, Result, StorageEngine};
use bucketkv_storage::RedbEngine;
use tracing::debug;

use super::Connection;

// =============================================================================
// Global Registry
// =============================================================================
//
// Opening the same path twice through `Connection::open` returns the same
// Connection. The storage engine holds an exclusive lock on its file, so a
// second handle for the same file could not be opened anyway.
//
// Uses parking_lot::Mutex so a panicking caller cannot poison the map for the
// rest of the process.

static GLOBAL_REGISTRY: Lazy<Arc<Registry<RedbEngine>>> = Lazy::new(Registry::<RedbEngine>::new);

/// The process-wide registry used by [`Connection::open`]
pub fn global() -> Arc<Registry<RedbEngine>> {
    Arc::clone(&GLOBAL_REGISTRY)
}

/// Normalize a storage path into its registry key
///
/// Uses the canonical path when the file exists, otherwise the canonical
/// parent directory joined with the file name, otherwise the path as given.
/// `data.db`, `./data.db` and its absolute form all map to one key.
pub fn registry_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Path -> Connection map with single-instance semantics
///
/// All map operations run under one short-held lock and never call into the
/// storage engine. Opening a path additionally serializes on a per-path gate so
/// two threads opening the same file do not both reach the engine.
pub struct Registry<E: StorageEngine = RedbEngine> {
    connections: Mutex<HashMap<PathBuf, Arc<Connection<E>>>>,
    gates: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<E: StorageEngine> Registry<E> {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// The live Connection registered for `path`, if any
    pub fn lookup(&self, path: impl AsRef<Path>) -> Option<Arc<Connection<E>>> {
        self.lookup_key(&registry_key(path.as_ref()))
    }

    /// Register `connection` unless another live connection holds its path
    ///
    /// Returns the registered instance: `connection` itself, or the existing
    /// winner when the path was already taken. A closed connection, or one
    /// opened through another registry, is never registered and yields `None`.
    pub fn insert(&self, connection: Arc<Connection<E>>) -> Option<Arc<Connection<E>>> {
        if connection.is_closed() {
            debug!(target: "bucketkv::registry", path = ?connection.path(), "Refusing to register a closed connection");
            return None;
        }
        // Close unregisters through the back-reference only
        if !std::ptr::eq(connection.registry.as_ptr(), self) {
            debug!(target: "bucketkv::registry", path = ?connection.path(), "Refusing to register a connection owned by another registry");
            return None;
        }

        let mut connections = self.connections.lock();
        match connections.entry(connection.path().to_path_buf()) {
            Entry::Vacant(slot) => Some(Arc::clone(slot.insert(connection))),
            Entry::Occupied(mut slot) => {
                if slot.get().is_closed() {
                    slot.insert(Arc::clone(&connection));
                    Some(connection)
                } else {
                    debug!(target: "bucketkv::registry", path = ?connection.path(), "Path already registered, keeping existing connection");
                    Some(Arc::clone(slot.get()))
                }
            }
        }
    }

    /// Remove the entry for `path`, returning it if present
    ///
    /// The removed connection is not closed.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Arc<Connection<E>>> {
        let key = registry_key(path.as_ref());
        self.connections.lock().remove(&key)
    }

    /// Whether a live connection is registered for `path`
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.lookup(path).is_some()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// Whether no connection is registered
    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Close every registered connection
    ///
    /// Attempts all of them and returns the first error encountered.
    pub fn close_all(&self) -> Result<()> {
        let connections: Vec<_> = self.connections.lock().values().cloned().collect();

        let mut first_error: Option<Error> = None;
        for connection in connections {
            if let Err(e) = connection.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn lookup_key(&self, key: &Path) -> Option<Arc<Connection<E>>> {
        let connections = self.connections.lock();
        connections.get(key).filter(|c| !c.is_closed()).cloned()
    }

    /// Remove `connection` only if it is the instance registered for its path
    pub(crate) fn unregister(&self, connection: &Connection<E>) {
        let mut connections = self.connections.lock();
        let registered = connections
            .get(connection.path())
            .is_some_and(|c| std::ptr::eq(Arc::as_ptr(c), connection));
        if registered {
            connections.remove(connection.path());
        }
    }

    pub(crate) fn open_gate(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock();
        Arc::clone(gates.entry(key.to_path_buf()).or_default())
    }

    pub(crate) fn release_gate(&self, key: &Path, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock();
        drop(gate);
        // Only the map's own reference left: nobody else is opening this path
        if gates.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(key);
        }
    }

    /// Number of paths with an open in progress
    #[cfg(test)]
    pub(crate) fn open_gates(&self) -> usize {
        self.gates.lock().len()
    }
}

impl<E: StorageEngine> std::fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<PathBuf> = self.connections.lock().keys().cloned().collect();
        f.debug_struct("Registry").field("paths", &paths).finish()
    }
}
