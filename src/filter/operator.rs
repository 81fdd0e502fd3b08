//! Filter operators as they appear in request filter maps.

use crate::access::TypeCategory;
use crate::error::SearchError;
use std::fmt;
use std::str::FromStr;

/// Operator family, which decides the field types an operator applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    Logical,
    String,
    Numeric,
    Range,
}

/// Number and kind of operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One filter node
    Unary,
    /// A field and a literal
    Binary,
    /// Two filter nodes
    Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
    Distinct,
    Equals,
    EqualsIc,
    Contains,
    ContainsIc,
    Starts,
    StartsIc,
    Ends,
    EndsIc,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 19] = [
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Distinct,
        Operator::Equals,
        Operator::EqualsIc,
        Operator::Contains,
        Operator::ContainsIc,
        Operator::Starts,
        Operator::StartsIc,
        Operator::Ends,
        Operator::EndsIc,
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Between,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Distinct => "distinct",
            Operator::Equals => "equals",
            Operator::EqualsIc => "equalsic",
            Operator::Contains => "contains",
            Operator::ContainsIc => "containsic",
            Operator::Starts => "starts",
            Operator::StartsIc => "startsic",
            Operator::Ends => "ends",
            Operator::EndsIc => "endsic",
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::Between => "between",
        }
    }

    pub fn category(&self) -> OperatorCategory {
        match self {
            Operator::And | Operator::Or | Operator::Not | Operator::Distinct => {
                OperatorCategory::Logical
            }
            Operator::Equals
            | Operator::EqualsIc
            | Operator::Contains
            | Operator::ContainsIc
            | Operator::Starts
            | Operator::StartsIc
            | Operator::Ends
            | Operator::EndsIc => OperatorCategory::String,
            Operator::Eq | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                OperatorCategory::Numeric
            }
            Operator::In | Operator::Between => OperatorCategory::Range,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Not => Arity::Unary,
            Operator::And | Operator::Or | Operator::Distinct => Arity::Compound,
            _ => Arity::Binary,
        }
    }

    pub fn is_logical(&self) -> bool {
        self.category() == OperatorCategory::Logical
    }

    /// `*ic` variants compare lower-cased operands
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Operator::EqualsIc | Operator::ContainsIc | Operator::StartsIc | Operator::EndsIc
        )
    }

    /// Whether the operator applies to a field of the given type category.
    ///
    /// `equals` and `eq` work on every scalar; pattern operators need text;
    /// ordering operators need numbers or temporals.
    pub fn accepts(&self, category: TypeCategory) -> bool {
        use TypeCategory::*;

        match self {
            Operator::And | Operator::Or | Operator::Not | Operator::Distinct => false,
            Operator::Equals | Operator::Eq => true,
            Operator::EqualsIc
            | Operator::Contains
            | Operator::ContainsIc
            | Operator::Starts
            | Operator::StartsIc
            | Operator::Ends
            | Operator::EndsIc => category == Textual,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Between => {
                matches!(category, Numeric | Temporal)
            }
            Operator::In => matches!(category, Textual | Numeric | Identifier | Temporal),
        }
    }
}

impl FromStr for Operator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| SearchError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
