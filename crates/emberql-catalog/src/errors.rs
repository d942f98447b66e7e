// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    TableNotFound(String),
    ColumnNotFound { column_name: String, table_name: String },
    ColumnIndexOutOfBounds { index: usize },
    IndexAlreadyExists(String),
    IndexNotFound(String),
    EmptyIndexKey(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::TableNotFound(name) => write!(f, "Table '{}' not found", name),
            CatalogError::ColumnNotFound { column_name, table_name } => {
                write!(f, "Column '{}' not found in table '{}'", column_name, table_name)
            }
            CatalogError::ColumnIndexOutOfBounds { index } => {
                write!(f, "Column index {} out of bounds", index)
            }
            CatalogError::IndexAlreadyExists(name) => {
                write!(f, "Index '{}' already exists", name)
            }
            CatalogError::IndexNotFound(name) => write!(f, "Index '{}' not found", name),
            CatalogError::EmptyIndexKey(name) => {
                write!(f, "Index '{}' has no key columns", name)
            }
        }
    }
}

impl std::error::Error for CatalogError {}
