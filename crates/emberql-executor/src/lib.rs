//! Query execution
//!
//! This crate provides the execution layer over the storage engine: the
//! expression evaluator, plan descriptors, and the nested-loop index join
//! operator.

pub mod errors;
pub mod evaluator;
pub mod join;
pub mod plan;

pub use errors::ExecutorError;
pub use evaluator::{CompareOp, Expression};
pub use join::NestLoopIndexExecutor;
pub use plan::{IndexLookup, JoinKind, NestLoopIndexPlan, SortDirection};
