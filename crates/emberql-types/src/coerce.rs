//! Typed coercion of values into declared key slots
//!
//! Index search keys are typed by the index key schema. Assigning a value of
//! a wider tier into a narrower slot can fall outside the slot's range; the
//! caller needs to distinguish that from an outright type mismatch, because
//! range scans can recover from an out-of-range terminal key column.

use std::fmt;

use crate::{DataType, SqlValue};

/// Failure to coerce a value into a declared type.
///
/// Overflow and Underflow each get their own variant so callers can
/// pattern-match the direction; anything else is Incompatible.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// The value is above the target type's range.
    Overflow { value: SqlValue, target: DataType },
    /// The value is below the target type's range.
    Underflow { value: SqlValue, target: DataType },
    /// The value's type cannot be coerced to the target at all.
    Incompatible { value: SqlValue, target: DataType },
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionError::Overflow { value, target } => {
                write!(f, "Value {} overflows type {}", value, target.type_name())
            }
            CoercionError::Underflow { value, target } => {
                write!(f, "Value {} underflows type {}", value, target.type_name())
            }
            CoercionError::Incompatible { value, target } => {
                write!(
                    f,
                    "Cannot coerce {} value to type {}",
                    value.type_name(),
                    target.type_name()
                )
            }
        }
    }
}

impl std::error::Error for CoercionError {}

/// Range of each exact numeric tier.
fn tier_range(target: &DataType) -> Option<(i64, i64)> {
    match target {
        DataType::Tinyint => Some((i8::MIN as i64, i8::MAX as i64)),
        DataType::Smallint => Some((i16::MIN as i64, i16::MAX as i64)),
        DataType::Integer => Some((i64::MIN, i64::MAX)),
        DataType::Bigint => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

fn make_integer(target: &DataType, v: i64) -> SqlValue {
    match target {
        DataType::Tinyint => SqlValue::Tinyint(v as i8),
        DataType::Smallint => SqlValue::Smallint(v as i16),
        DataType::Integer => SqlValue::Integer(v),
        DataType::Bigint => SqlValue::Bigint(v),
        _ => unreachable!("make_integer called with non-integer target"),
    }
}

impl SqlValue {
    /// Coerce this value for assignment into a key slot of the given type.
    ///
    /// NULL coerces to any type. Exact numeric values move between tiers
    /// with range checking; a double assigned to an integer tier truncates
    /// toward zero first. Out-of-range values signal `Overflow` or
    /// `Underflow`; type mismatches signal `Incompatible`.
    pub fn coerce_for_key(&self, target: &DataType) -> Result<SqlValue, CoercionError> {
        if self.is_null() {
            return Ok(SqlValue::Null);
        }

        match target {
            t if t.is_exact_numeric() => {
                let (min, max) = tier_range(t).expect("exact tier has a range");
                let candidate = match self {
                    v if v.as_i64().is_some() => v.as_i64().unwrap(),
                    SqlValue::Double(d) => {
                        if d.is_nan() {
                            return Err(self.incompatible_with(target));
                        }
                        if *d > max as f64 {
                            return Err(CoercionError::Overflow {
                                value: self.clone(),
                                target: target.clone(),
                            });
                        }
                        if *d < min as f64 {
                            return Err(CoercionError::Underflow {
                                value: self.clone(),
                                target: target.clone(),
                            });
                        }
                        d.trunc() as i64
                    }
                    _ => return Err(self.incompatible_with(target)),
                };

                if candidate > max {
                    Err(CoercionError::Overflow {
                        value: self.clone(),
                        target: target.clone(),
                    })
                } else if candidate < min {
                    Err(CoercionError::Underflow {
                        value: self.clone(),
                        target: target.clone(),
                    })
                } else {
                    Ok(make_integer(target, candidate))
                }
            }

            DataType::DoublePrecision => match self {
                SqlValue::Double(d) => Ok(SqlValue::Double(*d)),
                v => match v.as_i64() {
                    Some(i) => Ok(SqlValue::Double(i as f64)),
                    None => Err(self.incompatible_with(target)),
                },
            },

            DataType::Varchar { .. } => match self {
                SqlValue::Varchar(s) => Ok(SqlValue::Varchar(s.clone())),
                _ => Err(self.incompatible_with(target)),
            },

            DataType::Boolean => match self {
                SqlValue::Boolean(b) => Ok(SqlValue::Boolean(*b)),
                _ => Err(self.incompatible_with(target)),
            },

            _ => Err(self.incompatible_with(target)),
        }
    }

    fn incompatible_with(&self, target: &DataType) -> CoercionError {
        CoercionError::Incompatible {
            value: self.clone(),
            target: target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_coerces_anywhere() {
        assert_eq!(
            SqlValue::Null.coerce_for_key(&DataType::Tinyint),
            Ok(SqlValue::Null)
        );
    }

    #[test]
    fn test_narrowing_in_range() {
        assert_eq!(
            SqlValue::Integer(100).coerce_for_key(&DataType::Tinyint),
            Ok(SqlValue::Tinyint(100))
        );
        assert_eq!(
            SqlValue::Bigint(-30000).coerce_for_key(&DataType::Smallint),
            Ok(SqlValue::Smallint(-30000))
        );
    }

    #[test]
    fn test_narrowing_overflow() {
        let err = SqlValue::Integer(200)
            .coerce_for_key(&DataType::Tinyint)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Overflow { .. }));
    }

    #[test]
    fn test_narrowing_underflow() {
        let err = SqlValue::Integer(-200)
            .coerce_for_key(&DataType::Tinyint)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Underflow { .. }));
    }

    #[test]
    fn test_widening_always_fits() {
        assert_eq!(
            SqlValue::Tinyint(7).coerce_for_key(&DataType::Bigint),
            Ok(SqlValue::Bigint(7))
        );
        assert_eq!(
            SqlValue::Smallint(7).coerce_for_key(&DataType::DoublePrecision),
            Ok(SqlValue::Double(7.0))
        );
    }

    #[test]
    fn test_double_truncates_toward_zero() {
        assert_eq!(
            SqlValue::Double(-3.9).coerce_for_key(&DataType::Integer),
            Ok(SqlValue::Integer(-3))
        );
    }

    #[test]
    fn test_double_out_of_range() {
        let err = SqlValue::Double(1e9)
            .coerce_for_key(&DataType::Smallint)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Overflow { .. }));
        let err = SqlValue::Double(-1e9)
            .coerce_for_key(&DataType::Smallint)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Underflow { .. }));
    }

    #[test]
    fn test_incompatible_types() {
        let err = SqlValue::Varchar("5".to_string())
            .coerce_for_key(&DataType::Integer)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Incompatible { .. }));
        let err = SqlValue::Double(f64::NAN)
            .coerce_for_key(&DataType::Integer)
            .unwrap_err();
        assert!(matches!(err, CoercionError::Incompatible { .. }));
    }
}
