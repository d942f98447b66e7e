use emberql_types::DataType;

use crate::{CatalogError, TableSchema};

/// Schema metadata for an ordered secondary index.
///
/// Key columns are positions into the owning table's column list, in key
/// order. The index name is the handle plans use to resolve the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub name: String,
    pub table: String,
    pub key_columns: Vec<usize>,
}

impl IndexSchema {
    pub fn new(name: String, table: String, key_columns: Vec<usize>) -> Self {
        IndexSchema { name, table, key_columns }
    }

    /// Resolve the key column types against the owning table's schema.
    pub fn key_types(&self, schema: &TableSchema) -> Result<Vec<DataType>, CatalogError> {
        self.key_columns
            .iter()
            .map(|&col| {
                schema
                    .columns
                    .get(col)
                    .map(|c| c.data_type.clone())
                    .ok_or(CatalogError::ColumnIndexOutOfBounds { index: col })
            })
            .collect()
    }

    /// Number of key columns.
    pub fn key_column_count(&self) -> usize {
        self.key_columns.len()
    }
}
