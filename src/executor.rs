//! Executor layer for in-memory plan execution.
//!
//! This module implements the Volcano-style iterator model used by the
//! in-memory store. Each executor produces rows one at a time via `next()`,
//! so scan, join, filter, aggregate, projection, distinct, sort and paging
//! compose into a single pipeline.

use crate::access::{DataType, Value};
use anyhow::Result;
use std::hash::{Hash, Hasher};

pub mod aggregate;
pub mod distinct;
pub mod filter;
pub mod hash_join;
pub mod limit;
pub mod projection;
pub mod seq_scan;
pub mod sort;

pub use aggregate::{AggregateFunction, AggregateSpec, GroupByClause, HashAggregateExecutor};
pub use distinct::DistinctExecutor;
pub use filter::FilterExecutor;
pub use hash_join::HashJoinExecutor;
pub use limit::LimitExecutor;
pub use projection::ProjectionExecutor;
pub use seq_scan::SeqScanExecutor;
pub use sort::{NullOrder, SortCriteria, SortExecutor, SortOrder};

/// A row flowing between executors, positionally aligned with `output_schema()`
pub type Row = Vec<Value>;

/// Trait for all query executors
pub trait Executor: Send {
    /// Initialize the executor. This must be called before `next()`.
    fn init(&mut self) -> Result<()>;

    /// Get the next row from the executor.
    /// Returns None when there are no more rows.
    fn next(&mut self) -> Result<Option<Row>>;

    /// Get the output schema of this executor
    fn output_schema(&self) -> &[ColumnInfo];
}

/// Information about a column in the output schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Position of `name` in `schema`
pub fn column_index(schema: &[ColumnInfo], name: &str) -> Result<usize> {
    schema
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in input schema", name))
}

/// Column names of a schema, in order
pub fn column_names(schema: &[ColumnInfo]) -> Vec<String> {
    schema.iter().map(|c| c.name.clone()).collect()
}

/// Wrapper type for hash keys that implements Hash and Eq
#[derive(Clone, Debug)]
pub(crate) struct HashKey(pub Vec<Value>);

impl HashKey {
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Value::is_null)
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Boolean(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Int32(i) => {
            2u8.hash(state);
            i.hash(state);
        }
        Value::Int64(i) => {
            3u8.hash(state);
            i.hash(state);
        }
        Value::Float64(f) => {
            4u8.hash(state);
            f.to_bits().hash(state);
        }
        Value::String(s) => {
            5u8.hash(state);
            s.hash(state);
        }
        Value::Uuid(u) => {
            6u8.hash(state);
            u.hash(state);
        }
        Value::Date(d) => {
            7u8.hash(state);
            d.hash(state);
        }
        Value::DateTime(dt) => {
            8u8.hash(state);
            dt.hash(state);
        }
        Value::DateTimeOffset(dt) => {
            9u8.hash(state);
            dt.hash(state);
        }
        Value::List(items) => {
            10u8.hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
    }
}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            hash_value(value, state);
        }
    }
}

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| match (a, b) {
                (Value::Float64(x), Value::Float64(y)) => x.to_bits() == y.to_bits(),
                _ => a == b,
            })
    }
}

impl Eq for HashKey {}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use anyhow::bail;

    /// Executor producing a fixed set of rows
    pub(crate) struct MockExecutor {
        rows: Vec<Row>,
        schema: Vec<ColumnInfo>,
        current: usize,
        initialized: bool,
    }

    impl MockExecutor {
        pub(crate) fn new(rows: Vec<Row>, schema: Vec<ColumnInfo>) -> Self {
            Self {
                rows,
                schema,
                current: 0,
                initialized: false,
            }
        }
    }

    impl Executor for MockExecutor {
        fn init(&mut self) -> Result<()> {
            self.initialized = true;
            self.current = 0;
            Ok(())
        }

        fn next(&mut self) -> Result<Option<Row>> {
            if !self.initialized {
                bail!("Not initialized");
            }
            let row = self.rows.get(self.current).cloned();
            self.current += 1;
            Ok(row)
        }

        fn output_schema(&self) -> &[ColumnInfo] {
            &self.schema
        }
    }

    /// Drain an executor after initializing it
    pub(crate) fn collect(executor: &mut dyn Executor) -> Result<Vec<Row>> {
        executor.init()?;
        let mut rows = Vec::new();
        while let Some(row) = executor.next()? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub(crate) fn books() -> MockExecutor {
        let s = |v: &str| Value::String(v.to_string());
        MockExecutor::new(
            vec![
                vec![Value::Int64(1), s("Dune"), s("scifi"), Value::Float64(9.5)],
                vec![Value::Int64(2), s("Emma"), s("classic"), Value::Float64(4.0)],
                vec![Value::Int64(3), s("Neuromancer"), s("scifi"), Value::Float64(7.5)],
                vec![Value::Int64(4), s("Persuasion"), s("classic"), Value::Null],
                vec![Value::Int64(5), s("Untitled"), Value::Null, Value::Float64(1.0)],
            ],
            vec![
                ColumnInfo::new("id", DataType::Int64),
                ColumnInfo::new("title", DataType::Varchar),
                ColumnInfo::new("category", DataType::Varchar),
                ColumnInfo::new("price", DataType::Float64),
            ],
        )
    }
}
