//! Value layer shared by the filter compiler, the stores and reconstruction.
//!
//! - **DataType**: declared scalar types of entity attributes
//! - **Value**: typed literal and column values, with JSON coercion
//! - **ResultRow**: one alias-keyed row returned by a backing store

pub mod row;
pub mod value;

pub use row::ResultRow;
pub use value::{DataType, TypeCategory, Value};
