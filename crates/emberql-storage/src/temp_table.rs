//! Pool-backed temporary output table
//!
//! Operators emit result rows into a temp table. Each inserted row is
//! encoded into one variable-length payload held by a [`StringRef`] handle,
//! so row storage flows through the compacting pool and handle storage
//! through the exact-sized pool. Clearing a batch drops every payload under
//! a deferred-release scope: tombstoned rows are reclaimed in one drain
//! instead of compacting the pool once per row.

use emberql_catalog::TableSchema;
use tracing::trace;

use crate::memory::{PoolHandle, ScopedDeferredRelease, StringRef};
use crate::rowcodec::{decode_row, encode_row};
use crate::{Row, StorageError};

#[derive(Debug)]
pub struct TempTable {
    schema: TableSchema,
    rows: Vec<crate::memory::PooledRef>,
    /// Keeps the thread's pools alive for as long as this table holds rows.
    _pool: PoolHandle,
    /// Scratch encode buffer reused across inserts.
    scratch: Vec<u8>,
}

impl TempTable {
    pub fn new(schema: TableSchema) -> TempTable {
        TempTable {
            schema,
            rows: Vec::new(),
            _pool: PoolHandle::new(),
            scratch: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Append a row, copying it into pooled storage.
    pub fn insert(&mut self, row: &Row) -> Result<(), StorageError> {
        if row.len() != self.schema.column_count() {
            return Err(StorageError::ColumnCountMismatch {
                expected: self.schema.column_count(),
                actual: row.len(),
            });
        }
        self.scratch.clear();
        encode_row(row, &mut self.scratch);
        self.rows.push(StringRef::create(&self.scratch));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decode the row at `position`.
    pub fn row(&self, position: usize) -> Result<Row, StorageError> {
        let payload = self.rows.get(position).ok_or(StorageError::RowNotFound)?;
        // SAFETY: decoding performs no pool operations, so the payload
        // cannot relocate while the slice is borrowed.
        let bytes = unsafe { payload.as_bytes() };
        decode_row(bytes, self.schema.column_count())
    }

    /// Decode every row in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Row, StorageError>> + '_ {
        (0..self.rows.len()).map(|i| self.row(i))
    }

    /// Drop the whole batch in one deferred-release drain.
    pub fn clear(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        trace!(rows = self.rows.len(), "temp table cleared");
        let _guard = ScopedDeferredRelease::new();
        self.rows.clear();
    }
}

impl Drop for TempTable {
    fn drop(&mut self) {
        self.clear();
    }
}
