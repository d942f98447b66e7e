//! Comparison implementations for SqlValue

use crate::sql_value::SqlValue;
use std::cmp::Ordering;

/// PartialOrd implementation for SQL value comparison
///
/// Implements SQL comparison semantics:
/// - NULL comparisons return None (SQL UNKNOWN)
/// - Type mismatches return None (incomparable)
/// - NaN in floating point returns None (IEEE 754 semantics)
/// - All other comparisons follow Rust's natural ordering
impl PartialOrd for SqlValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use SqlValue::*;
        match (self, other) {
            // NULL comparisons return None (SQL UNKNOWN semantics)
            (Null, _) | (_, Null) => None,

            // Integer tiers
            (Tinyint(a), Tinyint(b)) => a.partial_cmp(b),
            (Smallint(a), Smallint(b)) => a.partial_cmp(b),
            (Integer(a), Integer(b)) => a.partial_cmp(b),
            (Bigint(a), Bigint(b)) => a.partial_cmp(b),

            // Floating point (handles NaN properly via IEEE 754)
            (Double(a), Double(b)) => a.partial_cmp(b),

            // String type (lexicographic comparison)
            (Varchar(a), Varchar(b)) => a.partial_cmp(b),

            // Boolean (false < true)
            (Boolean(a), Boolean(b)) => a.partial_cmp(b),

            // Type mismatch - incomparable
            _ => None,
        }
    }
}

/// Eq implementation for SqlValue
///
/// For index keys and grouping we need Eq semantics where:
/// - NULL == NULL (unlike SQL comparison)
/// - NaN == NaN (unlike IEEE 754)
/// - All other values use standard equality
impl Eq for SqlValue {}

/// Ord implementation for SqlValue
///
/// Required for BTreeMap usage in indexes for efficient ordered scans.
///
/// For index storage and sorting purposes, we define a total ordering where:
/// - NULL is treated as "less than" all other values (NULLS FIRST semantics)
/// - NaN is treated as "greater than" all other doubles for consistency
/// - Type mismatches use a type-based ordering
/// - Within each type, use natural ordering
///
/// Note: This differs from SQL comparison semantics (which uses three-valued
/// logic) but is necessary for BTreeMap keys which require total ordering.
impl Ord for SqlValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use SqlValue::*;

        // NULL ordering: NULL is less than everything else
        match (self, other) {
            (Null, Null) => return Ordering::Equal,
            (Null, _) => return Ordering::Less,
            (_, Null) => return Ordering::Greater,
            _ => {}
        }

        // Try partial comparison first
        if let Some(ordering) = self.partial_cmp(other) {
            return ordering;
        }

        // Handle NaN cases and type mismatches
        match (self, other) {
            // Double NaN handling: NaN sorts above every other double
            (Double(a), Double(b)) => {
                if a.is_nan() && b.is_nan() {
                    Ordering::Equal
                } else if a.is_nan() {
                    Ordering::Greater
                } else {
                    Ordering::Less // b must be NaN
                }
            }

            // Type mismatch - use type tag ordering for a stable sort order
            _ => {
                fn type_tag(val: &SqlValue) -> u8 {
                    match val {
                        Null => 0,
                        Tinyint(_) => 1,
                        Smallint(_) => 2,
                        Integer(_) => 3,
                        Bigint(_) => 4,
                        Double(_) => 5,
                        Varchar(_) => 6,
                        Boolean(_) => 7,
                    }
                }
                type_tag(self).cmp(&type_tag(other))
            }
        }
    }
}
