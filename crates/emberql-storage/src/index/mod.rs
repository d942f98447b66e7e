//! Ordered secondary indexes
//!
//! Indexes are BTreeMap-backed: keys are the indexed column values in key
//! order, entries hold the row ids carrying that key. The ordered map gives
//! us sorted iteration, which the scan motions turn into cursors.
//!
//! A scan can position on a *prefix* of the key columns: when a search key
//! loses its last column to overflow recovery, the remaining columns still
//! position the cursor and every row matching the surviving prefix scans.

mod key;

pub use key::SearchKey;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use emberql_catalog::{IndexSchema, TableSchema};
use emberql_types::{DataType, SqlValue};

use crate::{Row, StorageError};

/// Position of a row inside its table.
pub type RowId = usize;

/// An ordered index over one or more columns of a table.
#[derive(Debug, Clone)]
pub struct OrderedIndex {
    schema: IndexSchema,
    key_types: Vec<DataType>,
    entries: BTreeMap<Vec<SqlValue>, Vec<RowId>>,
}

impl OrderedIndex {
    pub fn new(schema: IndexSchema, table_schema: &TableSchema) -> Result<Self, StorageError> {
        if schema.key_columns.is_empty() {
            return Err(StorageError::EmptyIndexKey(schema.name.clone()));
        }
        let key_types = schema
            .key_types(table_schema)
            .map_err(|_| StorageError::ColumnIndexOutOfBounds {
                index: *schema.key_columns.iter().max().expect("non-empty key"),
            })?;
        Ok(OrderedIndex { schema, key_types, entries: BTreeMap::new() })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Data types of the key columns, in key order.
    pub fn key_types(&self) -> &[DataType] {
        &self.key_types
    }

    pub fn key_column_count(&self) -> usize {
        self.schema.key_columns.len()
    }

    /// Number of distinct keys in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a row to the index.
    pub fn insert(&mut self, row: &Row, row_id: RowId) -> Result<(), StorageError> {
        let key = self
            .schema
            .key_columns
            .iter()
            .map(|&col| {
                row.get(col)
                    .cloned()
                    .ok_or(StorageError::ColumnIndexOutOfBounds { index: col })
            })
            .collect::<Result<Vec<SqlValue>, StorageError>>()?;
        self.entries.entry(key).or_default().push(row_id);
        Ok(())
    }

    /// Position on rows whose leading key columns equal `prefix`.
    pub fn move_to_key(&self, prefix: &[SqlValue]) -> IndexCursor {
        self.scan(prefix, |ord| ord == Ordering::Equal, true)
    }

    /// Position on rows whose leading key columns are strictly greater.
    pub fn move_to_greater_than_key(&self, prefix: &[SqlValue]) -> IndexCursor {
        self.scan(prefix, |ord| ord == Ordering::Greater, false)
    }

    /// Position on rows whose leading key columns are greater or equal.
    pub fn move_to_key_or_greater(&self, prefix: &[SqlValue]) -> IndexCursor {
        self.scan(prefix, |ord| ord != Ordering::Less, false)
    }

    /// Position at one end of the whole index: the start when `to_start`,
    /// otherwise the end, stepping backwards.
    pub fn move_to_end(&self, to_start: bool) -> IndexCursor {
        let mut row_ids: Vec<RowId> =
            self.entries.values().flat_map(|ids| ids.iter().copied()).collect();
        if !to_start {
            row_ids.reverse();
        }
        IndexCursor { row_ids: row_ids.into_iter(), at_key: false }
    }

    fn scan(
        &self,
        prefix: &[SqlValue],
        keep: impl Fn(Ordering) -> bool,
        at_key: bool,
    ) -> IndexCursor {
        assert!(
            prefix.len() <= self.key_types.len(),
            "search prefix longer than the index key"
        );
        let row_ids: Vec<RowId> = self
            .entries
            .iter()
            .filter(|(key, _)| keep(key[..prefix.len()].cmp(prefix)))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        IndexCursor { row_ids: row_ids.into_iter(), at_key }
    }
}

/// A positioned scan over an [`OrderedIndex`].
///
/// The cursor is single-owner for the duration of the scan; stepping yields
/// row ids in positioning order until the scan is exhausted.
#[derive(Debug)]
pub struct IndexCursor {
    row_ids: std::vec::IntoIter<RowId>,
    at_key: bool,
}

impl IndexCursor {
    /// Step to the next row of the scan.
    pub fn next_value(&mut self) -> Option<RowId> {
        self.row_ids.next()
    }

    /// Step to the next row still under the positioned key.
    ///
    /// Only meaningful after an equality positioning.
    pub fn next_value_at_key(&mut self) -> Option<RowId> {
        debug_assert!(self.at_key, "next_value_at_key on a range cursor");
        self.row_ids.next()
    }
}
