//! Reusable typed search-key buffer
//!
//! The join operator builds one search key per outer row, into a buffer
//! sized once from the index key schema. Assignment coerces each value to
//! the declared column type so that out-of-range values surface as typed
//! overflow/underflow signals the operator can recover from.

use emberql_types::{CoercionError, DataType, SqlValue};

/// A typed, reusable key buffer matching an index key schema.
#[derive(Debug, Clone)]
pub struct SearchKey {
    types: Vec<DataType>,
    values: Vec<SqlValue>,
}

impl SearchKey {
    /// Build a key buffer for the given key column types, all columns NULL.
    pub fn new(types: Vec<DataType>) -> SearchKey {
        let values = vec![SqlValue::Null; types.len()];
        SearchKey { types, values }
    }

    /// Reset every key column to NULL.
    pub fn set_all_null(&mut self) {
        for value in &mut self.values {
            *value = SqlValue::Null;
        }
    }

    /// Assign a value to one key column, coercing to the column's type.
    ///
    /// Out-of-range assignments report `Overflow`/`Underflow`; incompatible
    /// types report `Incompatible`. The column keeps its prior value on
    /// failure.
    pub fn set(&mut self, slot: usize, value: SqlValue) -> Result<(), CoercionError> {
        let coerced = value.coerce_for_key(&self.types[slot])?;
        self.values[slot] = coerced;
        Ok(())
    }

    /// Number of key columns.
    pub fn column_count(&self) -> usize {
        self.types.len()
    }

    /// The leading `len` key columns, for positioning an index cursor.
    pub fn prefix(&self, len: usize) -> &[SqlValue] {
        &self.values[..len]
    }
}
