//! Ordering of selected rows.
//!
//! The child is drained into memory on `init()`. Each selection with a
//! priority contributes one key; rows equal on every key keep their input
//! order, which the paging window relies on.

use crate::access::Value;
use crate::executor::{ColumnInfo, Executor, Row};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort order for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// Sort criteria for a single column
#[derive(Debug, Clone)]
pub struct SortCriteria {
    /// Column index to sort by
    pub column_index: usize,
    /// Sort order (ASC/DESC)
    pub order: SortOrder,
    /// NULL ordering (FIRST/LAST)
    pub null_order: NullOrder,
}

impl SortCriteria {
    /// Create new sort criteria with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(column_index: usize, order: SortOrder) -> Self {
        let null_order = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self {
            column_index,
            order,
            null_order,
        }
    }

    /// Create new sort criteria with explicit NULL ordering
    pub fn with_null_order(column_index: usize, order: SortOrder, null_order: NullOrder) -> Self {
        Self {
            column_index,
            order,
            null_order,
        }
    }
}

/// Executor that sorts rows based on multiple criteria
pub struct SortExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// Sort criteria (in order of precedence)
    criteria: Vec<SortCriteria>,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    /// Materialized and sorted rows
    sorted_rows: Vec<Row>,
    /// Current position in sorted_rows
    current_position: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl SortExecutor {
    /// Create a new sort executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces rows
    /// * `criteria` - Sort criteria in order of precedence
    pub fn new(child: Box<dyn Executor>, criteria: Vec<SortCriteria>) -> Result<Self> {
        let output_schema = child.output_schema().to_vec();
        for criteria in &criteria {
            if criteria.column_index >= output_schema.len() {
                bail!(
                    "Sort column index {} is out of range (schema has {} columns)",
                    criteria.column_index,
                    output_schema.len()
                );
            }
        }

        Ok(Self {
            child,
            criteria,
            output_schema,
            sorted_rows: Vec::new(),
            current_position: 0,
            initialized: false,
        })
    }

    /// Compare two values according to sort order and null handling
    fn compare_values(v1: &Value, v2: &Value, order: SortOrder, null_order: NullOrder) -> Ordering {
        match (v1, v2) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => match null_order {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (_, Value::Null) => match null_order {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (v1, v2) => {
                // Incomparable values keep their input order
                let cmp = v1.compare(v2).unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            }
        }
    }

    fn compare_rows(criteria: &[SortCriteria], a: &Row, b: &Row) -> Ordering {
        for criteria in criteria {
            let cmp = Self::compare_values(
                &a[criteria.column_index],
                &b[criteria.column_index],
                criteria.order,
                criteria.null_order,
            );
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

impl Executor for SortExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;

        self.sorted_rows.clear();
        while let Some(row) = self.child.next()? {
            self.sorted_rows.push(row);
        }

        let criteria = &self.criteria;
        self.sorted_rows
            .sort_by(|a, b| Self::compare_rows(criteria, a, b));

        self.current_position = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        let row = self.sorted_rows.get(self.current_position).cloned();
        if row.is_some() {
            self.current_position += 1;
        }
        Ok(row)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
