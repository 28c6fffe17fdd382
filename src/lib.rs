//! bucketkv - shared connections to embedded bucketed key-value files
//!
//! Every storage file path gets at most one live [`Connection`] per process.
//! Opening a path that is already open returns the same `Arc<Connection>`;
//! closing it unregisters it so the next open starts fresh.
//!
//! # Quick Start
//!
//! ```ignore
//! use bucketkv::{is_not_found, Connection};
//!
//! let conn = Connection::open("app.redb")?;
//!
//! conn.put(b"users", b"1", b"Alice")?;
//! assert_eq!(conn.get(b"users", b"1")?, b"Alice");
//!
//! match conn.get(b"users", b"2") {
//!     Err(e) if is_not_found(&e) => println!("no such user"),
//!     other => println!("{:?}", other),
//! }
//!
//! conn.delete(b"users", b"1")?;
//! conn.delete_bucket(b"users")?;
//! conn.close()?;
//! ```
//!
//! # Architecture
//!
//! - `bucketkv-core`: error kinds and the storage engine traits
//! - `bucketkv-storage`: the redb engine and its configuration
//! - `bucketkv-engine`: the connection registry and connections

pub use bucketkv_core::{
    is_not_found, BucketRead, BucketWrite, EngineError, EngineResult, Error, Result, StorageEngine,
};
pub use bucketkv_engine::{global, registry_key, Connection, ConnectionBuilder, Registry};
pub use bucketkv_storage::{RedbConfig, RedbEngine, DEFAULT_FILE_MODE};
