//! Core types and traits for bucketkv
//!
//! This crate defines the pieces every other layer agrees on:
//! - Error: caller-facing error kinds and the `is_not_found` classifier
//! - EngineError: failures reported by a storage engine
//! - Traits: the engine boundary (StorageEngine, BucketRead, BucketWrite)
//!
//! Nothing in here performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{is_not_found, EngineError, EngineResult, Error, Result};
pub use traits::{BucketRead, BucketWrite, StorageEngine};
