use emberql_types::{CoercionError, SqlValue};

use crate::plan::IndexLookup;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorError {
    IndexNotFound(String),
    InvalidPlan(String),
    UnsupportedLookup(IndexLookup),
    ColumnIndexOutOfBounds { index: usize },
    MissingInput(&'static str),
    UnboundParameter { index: usize },
    InvalidPredicate(String),
    TypeMismatch { left: SqlValue, op: String, right: SqlValue },
    KeyCoercion(CoercionError),
    StorageError(String),
}

impl std::fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorError::IndexNotFound(name) => write!(f, "Index '{}' not found", name),
            ExecutorError::InvalidPlan(msg) => write!(f, "Invalid plan: {}", msg),
            ExecutorError::UnsupportedLookup(lookup) => {
                write!(f, "Lookup kind {:?} is not supported at scan entry", lookup)
            }
            ExecutorError::ColumnIndexOutOfBounds { index } => {
                write!(f, "Column index {} out of bounds", index)
            }
            ExecutorError::MissingInput(side) => {
                write!(f, "Expression references the {} tuple, but none is bound", side)
            }
            ExecutorError::UnboundParameter { index } => {
                write!(f, "Parameter {} has no bound value", index)
            }
            ExecutorError::InvalidPredicate(msg) => {
                write!(f, "Predicate must evaluate to boolean: {}", msg)
            }
            ExecutorError::TypeMismatch { left, op, right } => {
                write!(f, "Type mismatch: {:?} {} {:?}", left, op, right)
            }
            ExecutorError::KeyCoercion(err) => write!(f, "Search key assignment failed: {}", err),
            ExecutorError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ExecutorError {}

impl From<emberql_storage::StorageError> for ExecutorError {
    fn from(err: emberql_storage::StorageError) -> Self {
        ExecutorError::StorageError(err.to_string())
    }
}
