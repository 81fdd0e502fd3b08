//! Column selection and renaming.
//!
//! Search selections reach the caller under their aliases through this
//! executor.

use crate::executor::{ColumnInfo, Executor, Row};
use anyhow::{bail, Result};

/// Executor that projects specific columns from child rows
pub struct ProjectionExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// Indices of columns to project from the child's output
    column_indices: Vec<usize>,
    /// Output schema (projected, possibly renamed columns)
    output_schema: Vec<ColumnInfo>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl ProjectionExecutor {
    /// Create a new projection executor keeping the child's column names
    ///
    /// # Example
    /// ```ignore
    /// // If child produces columns [id, title, category, price]
    /// // column_indices [3, 0] would produce [price, id]
    /// ```
    pub fn new(child: Box<dyn Executor>, column_indices: Vec<usize>) -> Result<Self> {
        let names = column_indices
            .iter()
            .map(|&idx| {
                child
                    .output_schema()
                    .get(idx)
                    .map(|c| c.name.clone())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        Self::with_aliases(child, column_indices.into_iter().zip(names).collect())
    }

    /// Create a projection that renames every projected column
    ///
    /// # Arguments
    /// * `child` - The child executor that produces rows
    /// * `columns` - `(child column index, output name)` pairs in output order
    pub fn with_aliases(child: Box<dyn Executor>, columns: Vec<(usize, String)>) -> Result<Self> {
        let child_schema = child.output_schema();
        let mut column_indices = Vec::with_capacity(columns.len());
        let mut output_schema = Vec::with_capacity(columns.len());

        for (idx, alias) in columns {
            let Some(column) = child_schema.get(idx) else {
                bail!(
                    "Column index {} is out of bounds for schema with {} columns",
                    idx,
                    child_schema.len()
                );
            };
            column_indices.push(idx);
            output_schema.push(ColumnInfo::new(alias, column.data_type));
        }

        Ok(Self {
            child,
            column_indices,
            output_schema,
            initialized: false,
        })
    }
}

impl Executor for ProjectionExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        match self.child.next()? {
            Some(row) => Ok(Some(
                self.column_indices
                    .iter()
                    .map(|&idx| row[idx].clone())
                    .collect(),
            )),
            None => Ok(None),
        }
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
