//! Filter executor implementation.
//!
//! This executor keeps the rows of its child for which a predicate holds.
//! The predicate is written against column names and bound to the child's
//! layout when the executor is built; NULL results count as false.

use crate::access::DataType;
use crate::executor::{column_names, ColumnInfo, Executor, Row};
use crate::expression::{evaluate_predicate, Expression, TypeChecker};
use anyhow::{bail, Result};

/// Executor that filters rows based on an expression
pub struct FilterExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// Predicate bound to the child's output schema
    filter_expr: Expression,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl FilterExecutor {
    /// Create a new filter executor, binding and type checking `filter_expr`
    pub fn new(child: Box<dyn Executor>, filter_expr: &Expression) -> Result<Self> {
        let output_schema = child.output_schema().to_vec();
        let bound = filter_expr.bind(&column_names(&output_schema))?;

        let schema_types: Vec<DataType> = output_schema.iter().map(|c| c.data_type).collect();
        TypeChecker::new(&schema_types).check_filter_predicate(&bound)?;

        Ok(Self {
            child,
            filter_expr: bound,
            output_schema,
            initialized: false,
        })
    }
}

impl Executor for FilterExecutor {
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

        while let Some(row) = self.child.next()? {
            if evaluate_predicate(&self.filter_expr, &row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
