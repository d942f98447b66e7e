//! Plan descriptor for the nested-loop index join
//!
//! The planner hands the operator a read-only descriptor: the join kind,
//! the search-key expressions in key-column order, optional end and post
//! predicates, the inner projection, and how to drive the target index.

use crate::evaluator::Expression;

/// Join kind of the operator's emission discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// How the search key positions the inner index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLookup {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Requested inner scan direction. `Invalid` means the planner expressed no
/// preference; overflow recovery defaults it to ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
    Invalid,
}

/// Read-only plan input for [`NestLoopIndexExecutor`].
///
/// [`NestLoopIndexExecutor`]: crate::join::NestLoopIndexExecutor
#[derive(Debug, Clone)]
pub struct NestLoopIndexPlan {
    pub join_kind: JoinKind,
    /// Search-key expressions, one per leading index key column.
    pub search_key_exprs: Vec<Expression>,
    /// Evaluated against (outer, inner); false ends the inner scan.
    pub end_expr: Option<Expression>,
    /// Evaluated against (outer, inner); filters match candidates.
    pub post_expr: Option<Expression>,
    /// Projection applied to raw inner tuples, one per inner output column.
    pub output_exprs: Vec<Expression>,
    /// Name of the index on the inner table driving the scan.
    pub target_index: String,
    pub lookup: IndexLookup,
    pub sort_direction: SortDirection,
}
