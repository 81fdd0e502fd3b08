//! Errors raised while binding, checking or evaluating a predicate.

use crate::access::DataType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("{context} expects {expected}, found {actual}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    /// `right_type` is `None` for unary operators
    #[error("operator {operator} cannot apply to {left_type:?} and {right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    #[error("no column named {name} in the input")]
    UnknownColumn { name: String },

    #[error("column {name} was used before binding")]
    UnboundColumn { name: String },

    #[error("column position {index} is outside a row of width {row_size}")]
    ColumnIndexOutOfBounds { index: usize, row_size: usize },

    #[error("{message}")]
    EvaluationError { message: String },
}

pub type ExpressionResult<T> = Result<T, ExpressionError>;
