//! Operator definitions for predicate expressions.

use crate::access::{DataType, TypeCategory};

/// Binary operators supported in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Pattern matching
    StartsWith,
    EndsWith,
    Contains,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: DataType, right: DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if types_comparable(left, right) {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::StartsWith | BinaryOperator::EndsWith | BinaryOperator::Contains => {
                match (left, right) {
                    (DataType::Varchar, DataType::Varchar) => Some(DataType::Boolean),
                    _ => None,
                }
            }
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::StartsWith => "STARTS WITH",
            BinaryOperator::EndsWith => "ENDS WITH",
            BinaryOperator::Contains => "CONTAINS",
        }
    }
}

/// Same type, or both numeric
pub(crate) fn types_comparable(left: DataType, right: DataType) -> bool {
    left == right
        || (left.category() == TypeCategory::Numeric && right.category() == TypeCategory::Numeric)
}

/// Unary operators supported in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,

    // NULL checks
    IsNull,
    IsNotNull,
    /// True only for a TRUE operand; NULL becomes FALSE
    IsTrue,

    /// Lower-case a string operand
    Lower,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::IsTrue => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            UnaryOperator::Lower => match operand {
                DataType::Varchar => Some(DataType::Varchar),
                _ => None,
            },
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::IsTrue => "IS TRUE",
            UnaryOperator::Lower => "LOWER",
        }
    }
}
