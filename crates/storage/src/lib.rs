//! Storage layer for bucketkv
//!
//! This crate implements the engine boundary from `bucketkv-core` on top of
//! [redb](https://docs.rs/redb):
//! - RedbEngine: opens the storage file and runs read/write transactions
//! - Bucket mapping: each bucket is one redb table
//! - RedbConfig: engine options, loadable from TOML
//!
//! redb gives readers a consistent snapshot while a writer is in flight and
//! holds an exclusive lock on the storage file for as long as it is open.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod transaction;

pub use backend::RedbEngine;
pub use config::{RedbConfig, DEFAULT_FILE_MODE};
pub use transaction::{bucket_table_name, RedbReader, RedbWriter, BUCKET_TABLE_PREFIX};
