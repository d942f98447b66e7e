//! SQL Type System
//!
//! This crate provides the type system for the engine, including:
//! - Data type definitions (TINYINT through BIGINT, DOUBLE, VARCHAR, BOOLEAN)
//! - SQL value representation
//! - Typed key coercion with overflow/underflow signaling

mod coerce;
mod data_type;
mod sql_value;

pub use coerce::CoercionError;
pub use data_type::DataType;
pub use sql_value::SqlValue;
