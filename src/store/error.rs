//! Store layer error types.

use crate::expression::ExpressionError;
use thiserror::Error;

/// Errors raised while loading data into or executing plans against a store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Invalid row for '{table}': {reason}")]
    InvalidRow { table: String, reason: String },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl StoreError {
    /// Recover a typed error from an executor failure where one was wrapped
    pub fn from_execution(err: anyhow::Error) -> Self {
        let err = match err.downcast::<StoreError>() {
            Ok(store) => return store,
            Err(other) => other,
        };
        match err.downcast::<ExpressionError>() {
            Ok(expr) => StoreError::Expression(expr),
            Err(other) => StoreError::Execution(other),
        }
    }

    pub(crate) fn invalid_row(table: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidRow {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
