//! Backing-store predicate language.
//!
//! Filter trees compile into these expressions. They reference columns by
//! name, and a store binds the names to row positions before evaluating:
//! - Expression AST representation
//! - Type checking of bound predicates
//! - Three-valued evaluation against rows

pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, evaluate_predicate, ExpressionEvaluator};
pub use expr::{ColumnRef, Expression, Literal};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::{validate_filter_predicate, TypeChecker};
