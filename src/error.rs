//! Request-level error types.

use crate::access::DataType;
use crate::store::StoreError;
use thiserror::Error;

/// Errors a search request can fail with.
///
/// Everything except `Store` is detected before the backing store is called.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Cannot resolve field path '{path}' from entity '{entity}'")]
    UnresolvableFieldPath { entity: String, path: String },

    #[error("Type mismatch on '{path}': {reason}")]
    TypeMismatch { path: String, reason: String },

    #[error("Malformed filter at '{path}': {reason}")]
    MalformedFilterShape { path: String, reason: String },

    #[error("Field '{path}' appears both in groupBy and in an aggregate list")]
    AggregateFieldConflict { path: String },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Duplicate selection alias: {0}")]
    DuplicateAlias(String),

    #[error("Expected at most one result, found {found}")]
    NonUniqueResult { found: usize },

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid filter node: {0}")]
    InvalidNode(String),

    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SearchError {
    pub(crate) fn type_mismatch(path: &str, reason: impl Into<String>) -> Self {
        SearchError::TypeMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        SearchError::MalformedFilterShape {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn literal_mismatch(
        path: &str,
        literal: &serde_json::Value,
        expected: DataType,
    ) -> Self {
        Self::type_mismatch(path, format!("literal {} is not a valid {}", literal, expected))
    }
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
