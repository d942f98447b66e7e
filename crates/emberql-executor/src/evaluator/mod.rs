//! Expression evaluation over (outer, inner) tuple pairs
//!
//! Expressions are a tagged variant: literals, column references into either
//! side of a join, parameter placeholders bound before execution, and
//! comparison/boolean combinators. Comparison follows SQL three-valued
//! logic: a NULL operand makes the comparison NULL, and NULL is neither
//! true nor false.

use std::cmp::Ordering;

use emberql_storage::Row;
use emberql_types::SqlValue;

use crate::errors::ExecutorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// A scalar expression over an optional outer and optional inner tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(SqlValue),
    /// Column of the outer tuple.
    OuterColumn(usize),
    /// Column of the inner tuple.
    InnerColumn(usize),
    /// Runtime parameter; `bound` is filled in by [`Expression::substitute`].
    Parameter { index: usize, bound: Option<SqlValue> },
    Compare { op: CompareOp, left: Box<Expression>, right: Box<Expression> },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// An unbound parameter placeholder.
    pub fn parameter(index: usize) -> Expression {
        Expression::Parameter { index, bound: None }
    }

    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Expression {
        Expression::Compare { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Bind runtime parameter values into the expression tree in place.
    pub fn substitute(&mut self, params: &[SqlValue]) -> Result<(), ExecutorError> {
        match self {
            Expression::Literal(_) | Expression::OuterColumn(_) | Expression::InnerColumn(_) => {
                Ok(())
            }
            Expression::Parameter { index, bound } => {
                let value = params
                    .get(*index)
                    .ok_or(ExecutorError::UnboundParameter { index: *index })?;
                *bound = Some(value.clone());
                Ok(())
            }
            Expression::Compare { left, right, .. } => {
                left.substitute(params)?;
                right.substitute(params)
            }
            Expression::And(left, right) | Expression::Or(left, right) => {
                left.substitute(params)?;
                right.substitute(params)
            }
            Expression::Not(inner) => inner.substitute(params),
        }
    }

    /// Evaluate against the bound tuples.
    pub fn eval(
        &self,
        outer: Option<&Row>,
        inner: Option<&Row>,
    ) -> Result<SqlValue, ExecutorError> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::OuterColumn(index) => {
                let row = outer.ok_or(ExecutorError::MissingInput("outer"))?;
                row.get(*index)
                    .cloned()
                    .ok_or(ExecutorError::ColumnIndexOutOfBounds { index: *index })
            }

            Expression::InnerColumn(index) => {
                let row = inner.ok_or(ExecutorError::MissingInput("inner"))?;
                row.get(*index)
                    .cloned()
                    .ok_or(ExecutorError::ColumnIndexOutOfBounds { index: *index })
            }

            Expression::Parameter { index, bound } => bound
                .clone()
                .ok_or(ExecutorError::UnboundParameter { index: *index }),

            Expression::Compare { op, left, right } => {
                let lhs = left.eval(outer, inner)?;
                let rhs = right.eval(outer, inner)?;
                if lhs.is_null() || rhs.is_null() {
                    return Ok(SqlValue::Null);
                }
                match lhs.partial_cmp(&rhs) {
                    Some(ordering) => Ok(SqlValue::Boolean(op.accepts(ordering))),
                    None => Err(ExecutorError::TypeMismatch {
                        left: lhs,
                        op: op.symbol().to_string(),
                        right: rhs,
                    }),
                }
            }

            Expression::And(left, right) => {
                let lhs = left.eval(outer, inner)?;
                let rhs = right.eval(outer, inner)?;
                three_valued(lhs, rhs, "AND", |a, b| a && b, false)
            }

            Expression::Or(left, right) => {
                let lhs = left.eval(outer, inner)?;
                let rhs = right.eval(outer, inner)?;
                three_valued(lhs, rhs, "OR", |a, b| a || b, true)
            }

            Expression::Not(expr) => match expr.eval(outer, inner)? {
                SqlValue::Boolean(b) => Ok(SqlValue::Boolean(!b)),
                SqlValue::Null => Ok(SqlValue::Null),
                other => Err(ExecutorError::InvalidPredicate(format!(
                    "NOT applied to {}",
                    other.type_name()
                ))),
            },
        }
    }
}

/// Three-valued AND/OR: a NULL operand decides only when the other operand
/// cannot (`absorbing` is false for AND, true for OR).
fn three_valued(
    lhs: SqlValue,
    rhs: SqlValue,
    op: &str,
    combine: fn(bool, bool) -> bool,
    absorbing: bool,
) -> Result<SqlValue, ExecutorError> {
    match (lhs, rhs) {
        (SqlValue::Boolean(a), SqlValue::Boolean(b)) => Ok(SqlValue::Boolean(combine(a, b))),
        (SqlValue::Null, SqlValue::Boolean(b)) | (SqlValue::Boolean(b), SqlValue::Null) => {
            if b == absorbing {
                Ok(SqlValue::Boolean(b))
            } else {
                Ok(SqlValue::Null)
            }
        }
        (SqlValue::Null, SqlValue::Null) => Ok(SqlValue::Null),
        (a, b) => Err(ExecutorError::InvalidPredicate(format!(
            "{} applied to {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// True only for BOOLEAN TRUE; NULL is not true.
pub fn is_true(value: &SqlValue) -> bool {
    matches!(value, SqlValue::Boolean(true))
}

/// True only for BOOLEAN FALSE; NULL is not false.
pub fn is_false(value: &SqlValue) -> bool {
    matches!(value, SqlValue::Boolean(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer_row() -> Row {
        Row::new(vec![SqlValue::Integer(5), SqlValue::Varchar("a".to_string())])
    }

    fn inner_row() -> Row {
        Row::new(vec![SqlValue::Integer(8), SqlValue::Null])
    }

    #[test]
    fn test_column_references_pick_sides() {
        let outer = outer_row();
        let inner = inner_row();
        assert_eq!(
            Expression::OuterColumn(0).eval(Some(&outer), Some(&inner)).unwrap(),
            SqlValue::Integer(5)
        );
        assert_eq!(
            Expression::InnerColumn(0).eval(Some(&outer), Some(&inner)).unwrap(),
            SqlValue::Integer(8)
        );
        assert_eq!(
            Expression::InnerColumn(0).eval(Some(&outer), None).unwrap_err(),
            ExecutorError::MissingInput("inner")
        );
    }

    #[test]
    fn test_comparison_three_valued() {
        let outer = outer_row();
        let inner = inner_row();
        let cmp = Expression::compare(
            CompareOp::Lt,
            Expression::OuterColumn(0),
            Expression::InnerColumn(0),
        );
        assert_eq!(cmp.eval(Some(&outer), Some(&inner)).unwrap(), SqlValue::Boolean(true));

        let null_cmp = Expression::compare(
            CompareOp::Eq,
            Expression::InnerColumn(1),
            Expression::Literal(SqlValue::Integer(1)),
        );
        assert_eq!(null_cmp.eval(Some(&outer), Some(&inner)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_comparison_type_mismatch_propagates() {
        let cmp = Expression::compare(
            CompareOp::Eq,
            Expression::Literal(SqlValue::Integer(1)),
            Expression::Literal(SqlValue::Varchar("1".to_string())),
        );
        assert!(matches!(
            cmp.eval(None, None).unwrap_err(),
            ExecutorError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_substitute_binds_parameters() {
        let mut expr = Expression::compare(
            CompareOp::GtEq,
            Expression::OuterColumn(0),
            Expression::parameter(0),
        );
        let outer = outer_row();

        assert_eq!(
            expr.eval(Some(&outer), None).unwrap_err(),
            ExecutorError::UnboundParameter { index: 0 }
        );

        expr.substitute(&[SqlValue::Integer(3)]).unwrap();
        assert_eq!(expr.eval(Some(&outer), None).unwrap(), SqlValue::Boolean(true));

        // Re-binding replaces the previous value
        expr.substitute(&[SqlValue::Integer(9)]).unwrap();
        assert_eq!(expr.eval(Some(&outer), None).unwrap(), SqlValue::Boolean(false));
    }

    #[test]
    fn test_substitute_missing_parameter() {
        let mut expr = Expression::parameter(2);
        assert_eq!(
            expr.substitute(&[SqlValue::Integer(1)]).unwrap_err(),
            ExecutorError::UnboundParameter { index: 2 }
        );
    }

    #[test]
    fn test_and_or_null_semantics() {
        let t = || Expression::Literal(SqlValue::Boolean(true));
        let f = || Expression::Literal(SqlValue::Boolean(false));
        let n = || Expression::Literal(SqlValue::Null);

        let and = Expression::And(Box::new(t()), Box::new(n()));
        assert_eq!(and.eval(None, None).unwrap(), SqlValue::Null);
        let and = Expression::And(Box::new(f()), Box::new(n()));
        assert_eq!(and.eval(None, None).unwrap(), SqlValue::Boolean(false));
        let or = Expression::Or(Box::new(t()), Box::new(n()));
        assert_eq!(or.eval(None, None).unwrap(), SqlValue::Boolean(true));
        let or = Expression::Or(Box::new(f()), Box::new(n()));
        assert_eq!(or.eval(None, None).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_is_true_is_false() {
        assert!(is_true(&SqlValue::Boolean(true)));
        assert!(!is_true(&SqlValue::Null));
        assert!(is_false(&SqlValue::Boolean(false)));
        assert!(!is_false(&SqlValue::Null));
    }
}
