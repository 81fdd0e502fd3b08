//! Sequential scan executor implementation.

use crate::executor::{ColumnInfo, Executor, Row};
use crate::store::{CancellationToken, StoreError};
use anyhow::{bail, Result};
use std::sync::Arc;

/// Executor for sequential scans over a snapshot of table rows
pub struct SeqScanExecutor {
    table_name: String,
    rows: Arc<Vec<Row>>,
    output_schema: Vec<ColumnInfo>,
    cancel: CancellationToken,
    position: usize,
    initialized: bool,
}

impl SeqScanExecutor {
    /// Create a new sequential scan executor
    ///
    /// # Arguments
    /// * `table_name` - Table being scanned, for diagnostics
    /// * `schema` - Column layout of `rows`
    /// * `rows` - Snapshot of the table contents
    /// * `cancel` - Checked before every row is produced
    pub fn new(
        table_name: impl Into<String>,
        schema: Vec<ColumnInfo>,
        rows: Arc<Vec<Row>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            rows,
            output_schema: schema,
            cancel,
            position: 0,
            initialized: false,
        }
    }

    /// Qualify every output column with `prefix.`
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for column in &mut self.output_schema {
            column.name = format!("{}.{}", prefix, column.name);
        }
        self
    }
}

impl Executor for SeqScanExecutor {
    fn init(&mut self) -> Result<()> {
        self.position = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        if self.cancel.is_cancelled() {
            log::debug!("Scan of '{}' cancelled at row {}", self.table_name, self.position);
            return Err(StoreError::Cancelled.into());
        }

        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
