//! Connection layer for bucketkv
//!
//! This crate hands out shared connections to storage files:
//! - Registry: path -> Connection map guaranteeing one live connection per path
//! - Connection: bucket-scoped get/put/delete/delete_bucket over one engine
//! - ConnectionBuilder: custom engine options or a private registry
//!
//! The storage engine itself (pages, transactions, file locking) lives behind
//! the `StorageEngine` trait from `bucketkv-core`; redb is the default.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;


pub use bucketkv_core::{is_not_found, EngineError, Error, Result};
pub use connection::{global, registry_key, Connection, ConnectionBuilder, Registry};
