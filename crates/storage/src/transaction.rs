//! Bucket access inside redb transactions
//!
//! A bucket is one redb table. redb table names are strings while bucket names
//! are arbitrary bytes, so the table name is [`BUCKET_TABLE_PREFIX`] followed by
//! the URL-safe, unpadded base64 form of the bucket name. The mapping is
//! injective and never produces an empty table name.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bucketkv_core::{BucketRead, BucketWrite, EngineError, EngineResult};
use redb::{ReadTransaction, TableDefinition, TableError, TableHandle, WriteTransaction};

/// Prefix of every table that backs a bucket
pub const BUCKET_TABLE_PREFIX: &str = "bucket:";

type BucketTable<'n> = TableDefinition<'n, &'static [u8], &'static [u8]>;

/// redb table name for a bucket
pub fn bucket_table_name(bucket: &[u8]) -> String {
    format!("{}{}", BUCKET_TABLE_PREFIX, URL_SAFE_NO_PAD.encode(bucket))
}

/// A read-only redb transaction exposed as [`BucketRead`]
pub struct RedbReader {
    tx: ReadTransaction,
}

impl RedbReader {
    /// Wrap a read transaction
    pub const fn new(tx: ReadTransaction) -> Self {
        Self { tx }
    }
}

impl BucketRead for RedbReader {
    fn get(&self, bucket: &[u8], key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let name = bucket_table_name(bucket);
        let table = match self.tx.open_table(BucketTable::new(&name)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Err(EngineError::BucketMissing),
            Err(e) => return Err(EngineError::backend(e)),
        };
        let value = table.get(key).map_err(EngineError::backend)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

/// A read-write redb transaction exposed as [`BucketWrite`]
///
/// Nothing is visible to other transactions until [`RedbWriter::commit`].
pub struct RedbWriter {
    tx: WriteTransaction,
}

impl RedbWriter {
    /// Wrap a write transaction
    pub const fn new(tx: WriteTransaction) -> Self {
        Self { tx }
    }

    /// Commit every change made through this writer
    pub fn commit(self) -> EngineResult<()> {
        self.tx.commit().map_err(EngineError::backend)
    }

    /// Discard every change made through this writer
    pub fn abort(self) {
        // Ignore abort result - the changes are discarded either way
        drop(self.tx.abort());
    }

    fn bucket_exists(&self, name: &str) -> EngineResult<bool> {
        let mut tables = self.tx.list_tables().map_err(EngineError::backend)?;
        Ok(tables.any(|handle| handle.name() == name))
    }
}

impl BucketWrite for RedbWriter {
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> EngineResult<()> {
        let name = bucket_table_name(bucket);
        // open_table creates the table when it does not exist yet
        let mut table = self.tx.open_table(BucketTable::new(&name)).map_err(EngineError::backend)?;
        table.insert(key, value).map_err(EngineError::backend)?;
        Ok(())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> EngineResult<bool> {
        let name = bucket_table_name(bucket);
        if !self.bucket_exists(&name)? {
            return Err(EngineError::BucketMissing);
        }
        let mut table = self.tx.open_table(BucketTable::new(&name)).map_err(EngineError::backend)?;
        let removed = table.remove(key).map_err(EngineError::backend)?;
        Ok(removed.is_some())
    }

    fn delete_bucket(&mut self, bucket: &[u8]) -> EngineResult<()> {
        let name = bucket_table_name(bucket);
        match self.tx.delete_table(BucketTable::new(&name)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(EngineError::BucketMissing),
            Err(e) => Err(EngineError::backend(e)),
        }
    }
}
