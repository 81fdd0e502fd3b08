//! Predicate AST definitions.

use crate::access::{DataType, Value};
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::{ExpressionError, ExpressionResult};
use std::fmt;

/// Column reference in a predicate.
///
/// Predicates are built against column names; the store binds each name to its
/// position in the row layout it produces before evaluating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub name: String,
    /// Column index in the row (0-based), set by [`Expression::bind`]
    pub index: Option<usize>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn bound(index: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn bool(val: bool) -> Self {
        Self {
            value: Value::Boolean(val),
        }
    }
}

/// Predicate tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),

    ColumnRef(ColumnRef),

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Set membership; an empty list matches nothing
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
    },

    /// Inclusive range
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: Value) -> Self {
        Expression::Literal(Literal::new(value))
    }

    /// Predicate that accepts every row
    pub fn match_all() -> Self {
        Expression::Literal(Literal::bool(true))
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnRef::new(name))
    }

    /// Create a column reference already bound to a row position
    pub fn bound_column(index: usize, name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnRef::bound(index, name))
    }

    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn starts_with(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::StartsWith, left, right)
    }

    pub fn ends_with(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::EndsWith, left, right)
    }

    pub fn contains(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Contains, left, right)
    }

    pub fn lower(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Lower, operand)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    pub fn is_true(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsTrue, operand)
    }

    pub fn in_list(expr: Expression, list: Vec<Expression>) -> Self {
        Expression::In {
            expr: Box::new(expr),
            list,
        }
    }

    pub fn between(expr: Expression, low: Expression, high: Expression) -> Self {
        Expression::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
        }
    }

    /// Resolve every column name against the given row layout
    pub fn bind<S: AsRef<str>>(&self, columns: &[S]) -> ExpressionResult<Expression> {
        let bind_box = |e: &Expression| -> ExpressionResult<Box<Expression>> {
            Ok(Box::new(e.bind(columns)?))
        };

        Ok(match self {
            Expression::Literal(lit) => Expression::Literal(lit.clone()),
            Expression::ColumnRef(col) => {
                let index = columns
                    .iter()
                    .position(|c| c.as_ref() == col.name)
                    .ok_or_else(|| ExpressionError::UnknownColumn {
                        name: col.name.clone(),
                    })?;
                Expression::bound_column(index, col.name.clone())
            }
            Expression::BinaryOp { op, left, right } => Expression::BinaryOp {
                op: *op,
                left: bind_box(left)?,
                right: bind_box(right)?,
            },
            Expression::UnaryOp { op, operand } => Expression::UnaryOp {
                op: *op,
                operand: bind_box(operand)?,
            },
            Expression::In { expr, list } => Expression::In {
                expr: bind_box(expr)?,
                list: list
                    .iter()
                    .map(|e| e.bind(columns))
                    .collect::<ExpressionResult<Vec<_>>>()?,
            },
            Expression::Between { expr, low, high } => Expression::Between {
                expr: bind_box(expr)?,
                low: bind_box(low)?,
                high: bind_box(high)?,
            },
        })
    }

    /// Names of every column this expression reads
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::ColumnRef(col) => {
                if !names.contains(&col.name.as_str()) {
                    names.push(&col.name);
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_columns(names),
            Expression::In { expr, list } => {
                expr.collect_columns(names);
                for item in list {
                    item.collect_columns(names);
                }
            }
            Expression::Between { expr, low, high } => {
                expr.collect_columns(names);
                low.collect_columns(names);
                high.collect_columns(names);
            }
        }
    }

    /// True when no column is referenced anywhere below
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::ColumnRef(_) => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::In { expr, list } => {
                expr.is_constant() && list.iter().all(|e| e.is_constant())
            }
            Expression::Between { expr, low, high } => {
                expr.is_constant() && low.is_constant() && high.is_constant()
            }
        }
    }

    /// Static result type against positional input types; `None` when unknowable
    pub fn output_type(&self, input_schema: &[DataType]) -> Option<DataType> {
        match self {
            Expression::Literal(lit) => lit.value.data_type(),
            Expression::ColumnRef(col) => col.index.and_then(|i| input_schema.get(i).copied()),
            Expression::BinaryOp { op, left, right } => {
                let left_type = left.output_type(input_schema)?;
                let right_type = right.output_type(input_schema)?;
                op.output_type(left_type, right_type)
            }
            Expression::UnaryOp { op, operand } => {
                let operand_type = operand.output_type(input_schema)?;
                op.output_type(operand_type)
            }
            Expression::In { .. } | Expression::Between { .. } => Some(DataType::Boolean),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::ColumnRef(col) => f.write_str(&col.name),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::IsNull | UnaryOperator::IsNotNull | UnaryOperator::IsTrue => {
                    write!(f, "({} {})", operand, op.as_str())
                }
                UnaryOperator::Not | UnaryOperator::Lower => {
                    write!(f, "{}({})", op.as_str(), operand)
                }
            },
            Expression::In { expr, list } => {
                write!(f, "({} IN (", expr)?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("))")
            }
            Expression::Between { expr, low, high } => {
                write!(f, "({} BETWEEN {} AND {})", expr, low, high)
            }
        }
    }
}
