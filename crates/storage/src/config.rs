//! Engine configuration
//!
//! Options can be set programmatically or read from a TOML file:
//!
//! ```toml
//! # Page cache size in bytes (omit for redb's default)
//! cache_size = 16777216
//!
//! # Permission bits for a newly created storage file (Unix only)
//! file_mode = 0o600
//! ```

use bucketkv_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Permission bits used when the storage file does not exist yet
pub const DEFAULT_FILE_MODE: u32 = 0o600;

fn default_file_mode() -> u32 {
    DEFAULT_FILE_MODE
}

/// Configuration options for the redb engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedbConfig {
    /// Cache size in bytes. If not set, uses redb's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,

    /// Permission bits for a newly created storage file.
    /// Ignored on non-Unix platforms and for files that already exist.
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
}

impl Default for RedbConfig {
    fn default() -> Self {
        Self {
            cache_size: None,
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl RedbConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size
    #[must_use]
    pub const fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = Some(bytes);
        self
    }

    /// Set the permission bits for a newly created storage file
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the text is not valid TOML or has
    /// fields of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Read a configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::invalid_config(e.to_string()))
    }
}
