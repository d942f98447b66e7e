//! Join operators

mod nest_loop_index;

pub use nest_loop_index::NestLoopIndexExecutor;
