//! Distinct executor implementation.
//!
//! Drops rows whose values equal a row already produced. Used when a filter
//! requests de-duplication and when to-many joins fan out the root rows.

use crate::executor::{ColumnInfo, Executor, HashKey, Row};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Executor that removes duplicate rows, keeping the first occurrence
pub struct DistinctExecutor {
    child: Box<dyn Executor>,
    /// Columns compared for equality; all columns when empty
    key_indices: Vec<usize>,
    seen: HashSet<HashKey>,
    output_schema: Vec<ColumnInfo>,
    initialized: bool,
}

impl DistinctExecutor {
    pub fn new(child: Box<dyn Executor>) -> Self {
        let output_schema = child.output_schema().to_vec();
        Self {
            child,
            key_indices: Vec::new(),
            seen: HashSet::new(),
            output_schema,
            initialized: false,
        }
    }

    /// De-duplicate on a subset of columns only
    pub fn on_columns(child: Box<dyn Executor>, key_indices: Vec<usize>) -> Result<Self> {
        let width = child.output_schema().len();
        if let Some(idx) = key_indices.iter().find(|&&idx| idx >= width) {
            bail!("Distinct column index {} is out of bounds", idx);
        }
        let mut executor = Self::new(child);
        executor.key_indices = key_indices;
        Ok(executor)
    }

    fn key(&self, row: &Row) -> HashKey {
        if self.key_indices.is_empty() {
            HashKey(row.clone())
        } else {
            HashKey(self.key_indices.iter().map(|&idx| row[idx].clone()).collect())
        }
    }
}

impl Executor for DistinctExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.seen.clear();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        while let Some(row) = self.child.next()? {
            let key = self.key(&row);
            if self.seen.insert(key) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Value;
    use crate::executor::test_util::{books, collect};
    use crate::executor::ProjectionExecutor;

    #[test]
    fn test_distinct_whole_rows() -> Result<()> {
        let categories = ProjectionExecutor::new(Box::new(books()), vec![2])?;
        let mut executor = DistinctExecutor::new(Box::new(categories));
        let rows = collect(&mut executor)?;

        assert_eq!(
            rows,
            vec![
                vec![Value::String("scifi".into())],
                vec![Value::String("classic".into())],
                vec![Value::Null],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_distinct_on_key_columns() -> Result<()> {
        let mut executor = DistinctExecutor::on_columns(Box::new(books()), vec![2])?;
        let ids: Vec<Value> = collect(&mut executor)?
            .into_iter()
            .map(|row| row[0].clone())
            .collect();
        assert_eq!(ids, vec![Value::Int64(1), Value::Int64(2), Value::Int64(5)]);
        Ok(())
    }

    #[test]
    fn test_distinct_invalid_key() {
        assert!(DistinctExecutor::on_columns(Box::new(books()), vec![4]).is_err());
    }
}
