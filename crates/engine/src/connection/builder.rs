//! Connection builder for fluent configuration
//!
//! Provides a builder for opening a redb-backed connection with custom engine
//! options or through a registry other than the process-wide one.

use std::path::PathBuf;
use std::sync::Arc;

use bucketkv_core::{Error, Result};
use bucketkv_storage::{RedbConfig, RedbEngine};

use super::registry::{self, Registry};
use super::Connection;

/// Builder for opening a [`Connection`]
///
/// ```ignore
/// use bucketkv_engine::{Connection, Registry};
///
/// // Process-wide registry, default options (same as Connection::open)
/// let conn = Connection::builder().path("data.redb").open()?;
///
/// // Private registry, larger page cache
/// let registry = Registry::new();
/// let conn = Connection::builder()
///     .path("data.redb")
///     .cache_size(64 * 1024 * 1024)
///     .registry(registry.clone())
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    /// Storage file path (required for open())
    path: Option<PathBuf>,
    /// Engine options, used only if the file is not already open
    config: RedbConfig,
    /// Registry to open through; the global one when unset
    registry: Option<Arc<Registry<RedbEngine>>>,
}

impl ConnectionBuilder {
    /// Create new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage file path
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace all engine options
    pub fn config(mut self, config: RedbConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the engine cache size in bytes
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config = self.config.cache_size(bytes);
        self
    }

    /// Set the permission bits used if the file has to be created
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config = self.config.file_mode(mode);
        self
    }

    /// Open through `registry` instead of the process-wide one
    pub fn registry(mut self, registry: Arc<Registry<RedbEngine>>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Open the connection
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if no path was set
    /// - [`Error::OpenFailed`] if the engine cannot open the file
    pub fn open(self) -> Result<Arc<Connection>> {
        let path = self
            .path
            .ok_or_else(|| Error::invalid_config("ConnectionBuilder::open() requires a path"))?;
        let registry = self.registry.unwrap_or_else(registry::global);

        Connection::open_in(&registry, path, &self.config)
    }
}
