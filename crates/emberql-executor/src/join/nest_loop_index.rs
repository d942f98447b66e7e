//! Nested-loop join driving an ordered index on the inner table
//!
//! For each outer tuple the operator builds a typed search key, positions
//! the inner index, and scans: matches passing the post predicate are
//! concatenated (outer columns verbatim, then the projected inner columns)
//! into the pooled temp output table. A false end predicate stops the inner
//! scan for the current outer tuple. A left join pads an all-NULL inner
//! side for outer tuples that matched nothing.
//!
//! Search-key construction recovers from typed overflow/underflow on the
//! terminal key column of a range lookup by shrinking the key, so that e.g.
//! `TINYINT < 1000` still scans every qualifying row instead of failing.

use emberql_catalog::{ColumnSchema, TableSchema};
use emberql_storage::{Row, SearchKey, Table, TempTable};
use emberql_types::{CoercionError, DataType, SqlValue};
use tracing::trace;

use crate::errors::ExecutorError;
use crate::evaluator::{is_false, is_true, Expression};
use crate::plan::{IndexLookup, JoinKind, NestLoopIndexPlan, SortDirection};

#[derive(Debug)]
pub struct NestLoopIndexExecutor {
    plan: NestLoopIndexPlan,
    search_key: SearchKey,
    /// Reused across emissions; outer columns first, then inner projections.
    join_row: Row,
    output: TempTable,
    num_outer_cols: usize,
}

impl NestLoopIndexExecutor {
    /// Validate the plan against the input shapes and set up the operator's
    /// buffers.
    ///
    /// Fails recoverably when the target index is missing or the plan's key
    /// arity does not fit the index. (A plan with an absent search-key
    /// expression cannot be constructed in the first place.)
    pub fn new(
        plan: NestLoopIndexPlan,
        outer_schema: &TableSchema,
        inner_table: &Table,
    ) -> Result<NestLoopIndexExecutor, ExecutorError> {
        let index = inner_table
            .index(&plan.target_index)
            .ok_or_else(|| ExecutorError::IndexNotFound(plan.target_index.clone()))?;

        if plan.search_key_exprs.len() > index.key_column_count() {
            return Err(ExecutorError::InvalidPlan(format!(
                "{} search key expressions against a {}-column index",
                plan.search_key_exprs.len(),
                index.key_column_count()
            )));
        }

        let search_key = SearchKey::new(index.key_types().to_vec());

        let num_outer_cols = outer_schema.column_count();
        let mut columns = outer_schema.columns.clone();
        for (i, expr) in plan.output_exprs.iter().enumerate() {
            columns.push(output_column(expr, inner_table, num_outer_cols + i)?);
        }
        let output_schema = TableSchema::new(
            format!("{}_x_{}", outer_schema.name, inner_table.schema.name),
            columns,
        );
        let join_row = Row::all_null(num_outer_cols + plan.output_exprs.len());

        Ok(NestLoopIndexExecutor {
            plan,
            search_key,
            join_row,
            output: TempTable::new(output_schema),
            num_outer_cols,
        })
    }

    /// Run the join over the outer table, emitting into the operator's temp
    /// output table. The previous invocation's batch is cleared first.
    pub fn execute(
        &mut self,
        params: &[SqlValue],
        outer: &Table,
        inner: &Table,
    ) -> Result<&TempTable, ExecutorError> {
        if outer.column_count() != self.num_outer_cols {
            return Err(ExecutorError::InvalidPlan(format!(
                "outer input has {} columns, expected {}",
                outer.column_count(),
                self.num_outer_cols
            )));
        }
        let index = inner
            .index(&self.plan.target_index)
            .ok_or_else(|| ExecutorError::IndexNotFound(self.plan.target_index.clone()))?;

        self.output.clear();

        for expr in &mut self.plan.search_key_exprs {
            expr.substitute(params)?;
        }
        if let Some(expr) = &mut self.plan.end_expr {
            expr.substitute(params)?;
        }
        if let Some(expr) = &mut self.plan.post_expr {
            expr.substitute(params)?;
        }

        let num_search_keys = self.plan.search_key_exprs.len();
        let num_inner_cols = self.plan.output_exprs.len();
        trace!(
            outer = %outer.schema.name,
            inner = %inner.schema.name,
            search_keys = num_search_keys,
            "nested-loop index join"
        );

        for outer_row in outer.rows() {
            let mut active_keys = num_search_keys;
            let mut local_lookup = self.plan.lookup;
            let mut local_sort = self.plan.sort_direction;
            let mut matched = false;
            let mut key_error = false;

            // Use the outer tuple to construct the search key against the
            // inner table.
            self.search_key.set_all_null();
            for ctr in 0..num_search_keys {
                let candidate = self.plan.search_key_exprs[ctr].eval(Some(outer_row), None)?;
                let assign = self.search_key.set(ctr, candidate);
                let err = match assign {
                    Ok(()) => continue,
                    Err(err) => err,
                };

                // Incompatible assignments are ordinary evaluation errors;
                // only overflow/underflow gets the recovery treatment.
                if matches!(err, CoercionError::Incompatible { .. }) {
                    return Err(ExecutorError::KeyCoercion(err));
                }

                // Out-of-range on the terminal column of a multi-column
                // range lookup degrades the scan instead of failing it,
                // e.g. TINYINT < 1000 should still return all values.
                if local_lookup != IndexLookup::Eq
                    && ctr == num_search_keys - 1
                    && num_search_keys > 1
                {
                    match err {
                        CoercionError::Overflow { .. } => {
                            match local_lookup {
                                IndexLookup::Gt | IndexLookup::Gte => {
                                    // No inner key can exceed the overflowed
                                    // value; only a left-outer row can come
                                    // out of this outer tuple.
                                    key_error = true;
                                    break;
                                }
                                _ => return Err(ExecutorError::KeyCoercion(err)),
                            }
                        }
                        CoercionError::Underflow { .. } => match local_lookup {
                            IndexLookup::Lt | IndexLookup::Lte => {
                                return Err(ExecutorError::KeyCoercion(err));
                            }
                            IndexLookup::Gte => {
                                // GTE after underflow conflicts with NULL
                                // ordering; GT over the shrunk key is safe.
                                local_lookup = IndexLookup::Gt;
                            }
                            _ => {}
                        },
                        CoercionError::Incompatible { .. } => unreachable!("handled above"),
                    }

                    // Scan every inner tuple matching the surviving key
                    // columns.
                    active_keys -= 1;
                    if local_sort == SortDirection::Invalid {
                        local_sort = SortDirection::Asc;
                    }
                } else {
                    // Out of range under EQ or on a non-terminal column:
                    // this outer tuple cannot match.
                    key_error = true;
                }
                break;
            }

            if !key_error {
                let mut cursor = if active_keys > 0 {
                    let prefix = self.search_key.prefix(active_keys);
                    match local_lookup {
                        IndexLookup::Eq => index.move_to_key(prefix),
                        IndexLookup::Gt => index.move_to_greater_than_key(prefix),
                        IndexLookup::Gte => index.move_to_key_or_greater(prefix),
                        IndexLookup::Lt | IndexLookup::Lte => {
                            return Err(ExecutorError::UnsupportedLookup(local_lookup));
                        }
                    }
                } else {
                    index.move_to_end(local_sort != SortDirection::Desc)
                };

                loop {
                    let row_id = if local_lookup == IndexLookup::Eq && active_keys > 0 {
                        cursor.next_value_at_key()
                    } else {
                        cursor.next_value()
                    };
                    let Some(row_id) = row_id else { break };
                    let inner_row = inner.row(row_id).ok_or_else(|| {
                        ExecutorError::StorageError(format!(
                            "index row {} missing from table '{}'",
                            row_id, inner.schema.name
                        ))
                    })?;

                    matched = true;

                    // End of the qualifying range for this outer tuple
                    if let Some(end) = &self.plan.end_expr {
                        if is_false(&end.eval(Some(outer_row), Some(inner_row))?) {
                            trace!("end expression false, stopping inner scan");
                            break;
                        }
                    }

                    let passes = match &self.plan.post_expr {
                        None => true,
                        Some(post) => is_true(&post.eval(Some(outer_row), Some(inner_row))?),
                    };
                    if passes {
                        for (col, value) in outer_row.values.iter().enumerate() {
                            self.join_row.set(col, value.clone())?;
                        }
                        for (col, expr) in self.plan.output_exprs.iter().enumerate() {
                            let value = expr.eval(None, Some(inner_row))?;
                            self.join_row.set(self.num_outer_cols + col, value)?;
                        }
                        self.output.insert(&self.join_row)?;
                    }
                }
            }

            // Left outer join: pad the inner side with NULLs. Outer columns
            // are copied here as well; nothing depends on what the buffer
            // held from previous emissions.
            if !matched && self.plan.join_kind == JoinKind::Left {
                for (col, value) in outer_row.values.iter().enumerate() {
                    self.join_row.set(col, value.clone())?;
                }
                for col in 0..num_inner_cols {
                    self.join_row.set(self.num_outer_cols + col, SqlValue::Null)?;
                }
                self.output.insert(&self.join_row)?;
            }
        }

        trace!(rows = self.output.len(), "nested-loop index join finished");
        Ok(&self.output)
    }

    /// The operator's output table from the most recent `execute`.
    pub fn output(&self) -> &TempTable {
        &self.output
    }
}

/// Synthesize the output column for one inner projection expression.
fn output_column(
    expr: &Expression,
    inner_table: &Table,
    position: usize,
) -> Result<ColumnSchema, ExecutorError> {
    match expr {
        Expression::InnerColumn(col) => {
            let mut column = inner_table
                .schema
                .columns
                .get(*col)
                .cloned()
                .ok_or(ExecutorError::ColumnIndexOutOfBounds { index: *col })?;
            column.nullable = true;
            Ok(column)
        }
        _ => Ok(ColumnSchema::new(format!("c{}", position), DataType::Null, true)),
    }
}
