/// SQL Data Types
///
/// Represents the declared type of a column or key slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    // Exact numeric types, narrowest to widest
    Tinyint,
    Smallint,
    Integer,
    Bigint,

    // Approximate numeric type
    DoublePrecision,

    // Character string type
    Varchar { max_length: Option<usize> },

    // Boolean type
    Boolean,

    // Special type for NULL
    Null,
}

impl DataType {
    /// Check if this type is compatible with another type for operations
    ///
    /// NULL is compatible with any type; the integer tiers are compatible
    /// with each other (coercion decides whether a value actually fits).
    pub fn is_compatible_with(&self, other: &DataType) -> bool {
        if matches!(self, DataType::Null) || matches!(other, DataType::Null) {
            return true;
        }

        match (self, other) {
            (a, b) if a == b => true,
            (a, b) if a.is_exact_numeric() && b.is_exact_numeric() => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (DataType::Varchar { .. }, DataType::Varchar { .. }) => true,
            _ => false,
        }
    }

    /// True for the exact (integer) numeric tiers.
    pub fn is_exact_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Tinyint | DataType::Smallint | DataType::Integer | DataType::Bigint
        )
    }

    /// True for any numeric type, exact or approximate.
    pub fn is_numeric(&self) -> bool {
        self.is_exact_numeric() || matches!(self, DataType::DoublePrecision)
    }

    /// Get the type name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Tinyint => "TINYINT",
            DataType::Smallint => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::Bigint => "BIGINT",
            DataType::DoublePrecision => "DOUBLE PRECISION",
            DataType::Varchar { .. } => "VARCHAR",
            DataType::Boolean => "BOOLEAN",
            DataType::Null => "NULL",
        }
    }
}
