// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    ColumnCountMismatch { expected: usize, actual: usize },
    ColumnIndexOutOfBounds { index: usize },
    RowNotFound,
    IndexAlreadyExists(String),
    IndexNotFound(String),
    EmptyIndexKey(String),
    KeyArityMismatch { expected: usize, actual: usize },
    CorruptPayload(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ColumnCountMismatch { expected, actual } => {
                write!(f, "Column count mismatch: expected {}, got {}", expected, actual)
            }
            StorageError::ColumnIndexOutOfBounds { index } => {
                write!(f, "Column index {} out of bounds", index)
            }
            StorageError::RowNotFound => write!(f, "Row not found"),
            StorageError::IndexAlreadyExists(name) => {
                write!(f, "Index '{}' already exists", name)
            }
            StorageError::IndexNotFound(name) => write!(f, "Index '{}' not found", name),
            StorageError::EmptyIndexKey(name) => {
                write!(f, "Index '{}' has no key columns", name)
            }
            StorageError::KeyArityMismatch { expected, actual } => {
                write!(f, "Search key has {} columns, index expects at most {}", actual, expected)
            }
            StorageError::CorruptPayload(msg) => write!(f, "Corrupt row payload: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}
