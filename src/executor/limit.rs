//! Page window: skip `offset` rows, then stop after `limit`.

use crate::executor::{ColumnInfo, Executor, Row};
use anyhow::{bail, Result};

/// Executor that limits the number of rows returned
pub struct LimitExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// Maximum number of rows to return, unbounded when None
    limit: Option<usize>,
    /// Number of rows to skip before returning
    offset: usize,
    /// Number of rows skipped so far
    skipped: usize,
    /// Number of rows returned so far
    returned: usize,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl LimitExecutor {
    /// Create a new limit executor with only limit
    pub fn new(child: Box<dyn Executor>, limit: usize) -> Self {
        Self::with_offset(child, Some(limit), 0)
    }

    /// Create a new limit executor with limit and offset
    ///
    /// # Arguments
    /// * `child` - The child executor that produces rows
    /// * `limit` - The maximum number of rows to return
    /// * `offset` - The number of rows to skip before returning
    pub fn with_offset(child: Box<dyn Executor>, limit: Option<usize>, offset: usize) -> Self {
        let output_schema = child.output_schema().to_vec();
        Self {
            child,
            limit,
            offset,
            skipped: 0,
            returned: 0,
            output_schema,
            initialized: false,
        }
    }
}

impl Executor for LimitExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;
        self.skipped = 0;
        self.returned = 0;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        if self.limit.is_some_and(|limit| self.returned >= limit) {
            return Ok(None);
        }

        while self.skipped < self.offset {
            match self.child.next()? {
                Some(_) => self.skipped += 1,
                None => return Ok(None),
            }
        }

        match self.child.next()? {
            Some(row) => {
                self.returned += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
