// ============================================================================
// Table
// ============================================================================

use emberql_catalog::{IndexSchema, TableSchema};

use crate::index::{OrderedIndex, RowId};
use crate::{Row, StorageError};

/// Normalize an index name for case-insensitive comparison, following SQL
/// identifier rules.
fn normalize_index_name(name: &str) -> String {
    name.to_uppercase()
}

/// In-memory table - stores rows and the ordered indexes built over them
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: TableSchema,
    rows: Vec<Row>,
    indexes: Vec<OrderedIndex>,
}

impl Table {
    /// Create a new empty table with given schema
    pub fn new(schema: TableSchema) -> Self {
        Table { schema, rows: Vec::new(), indexes: Vec::new() }
    }

    /// Insert a row into the table
    pub fn insert(&mut self, row: Row) -> Result<RowId, StorageError> {
        if row.len() != self.schema.column_count() {
            return Err(StorageError::ColumnCountMismatch {
                expected: self.schema.column_count(),
                actual: row.len(),
            });
        }

        let row_id = self.rows.len();
        for index in &mut self.indexes {
            index.insert(&row, row_id)?;
        }
        self.rows.push(row);
        Ok(row_id)
    }

    /// Build an ordered index over the current rows
    pub fn create_index(&mut self, schema: IndexSchema) -> Result<(), StorageError> {
        let normalized = normalize_index_name(&schema.name);
        if self
            .indexes
            .iter()
            .any(|idx| normalize_index_name(idx.name()) == normalized)
        {
            return Err(StorageError::IndexAlreadyExists(schema.name));
        }

        let mut index = OrderedIndex::new(schema, &self.schema)?;
        for (row_id, row) in self.rows.iter().enumerate() {
            index.insert(row, row_id)?;
        }
        self.indexes.push(index);
        Ok(())
    }

    /// Resolve an index by name, case-insensitively
    pub fn index(&self, name: &str) -> Option<&OrderedIndex> {
        let normalized = normalize_index_name(name);
        self.indexes
            .iter()
            .find(|idx| normalize_index_name(idx.name()) == normalized)
    }

    /// Get a row by id
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    /// All rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }
}
