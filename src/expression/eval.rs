//! Predicate evaluation against rows.

use crate::access::Value;
use crate::expression::{
    BinaryOperator, ColumnRef, Expression, ExpressionError, ExpressionResult, UnaryOperator,
};
use std::cmp::Ordering;

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// The row values to evaluate against
    row: &'a [Value],
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(row: &'a [Value]) -> Self {
        Self { row }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.clone()),

            Expression::ColumnRef(col) => self.evaluate_column_ref(col),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::In { expr, list } => {
                let value = self.evaluate(expr)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                for item in list {
                    let candidate = self.evaluate(item)?;
                    if value.compare(&candidate) == Some(Ordering::Equal) {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }

            Expression::Between { expr, low, high } => {
                let value = self.evaluate(expr)?;
                let low = self.evaluate(low)?;
                let high = self.evaluate(high)?;
                if value.is_null() || low.is_null() || high.is_null() {
                    return Ok(Value::Null);
                }
                let above = self.order(&value, &low, "BETWEEN")? != Ordering::Less;
                let below = self.order(&value, &high, "BETWEEN")? != Ordering::Greater;
                Ok(Value::Boolean(above && below))
            }
        }
    }

    fn evaluate_column_ref(&self, col: &ColumnRef) -> ExpressionResult<Value> {
        let index = col.index.ok_or_else(|| ExpressionError::UnboundColumn {
            name: col.name.clone(),
        })?;
        self.row
            .get(index)
            .cloned()
            .ok_or(ExpressionError::ColumnIndexOutOfBounds {
                index,
                row_size: self.row.len(),
            })
    }

    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        // Three-valued logic
        if left.is_null() || right.is_null() {
            return Ok(match op {
                BinaryOperator::And => match (&left, &right) {
                    (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                        Value::Boolean(false)
                    }
                    _ => Value::Null,
                },
                BinaryOperator::Or => match (&left, &right) {
                    (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                    _ => Value::Null,
                },
                _ => Value::Null,
            });
        }

        match op {
            BinaryOperator::Eq => self.compare_values(op, &left, &right, |o| o == Ordering::Equal),
            BinaryOperator::Ne => self.compare_values(op, &left, &right, |o| o != Ordering::Equal),
            BinaryOperator::Lt => self.compare_values(op, &left, &right, |o| o == Ordering::Less),
            BinaryOperator::Le => {
                self.compare_values(op, &left, &right, |o| o != Ordering::Greater)
            }
            BinaryOperator::Gt => {
                self.compare_values(op, &left, &right, |o| o == Ordering::Greater)
            }
            BinaryOperator::Ge => self.compare_values(op, &left, &right, |o| o != Ordering::Less),

            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
                _ => Err(invalid_operands(op.as_str(), &left, Some(&right))),
            },

            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
                _ => Err(invalid_operands(op.as_str(), &left, Some(&right))),
            },

            BinaryOperator::StartsWith | BinaryOperator::EndsWith | BinaryOperator::Contains => {
                match (&left, &right) {
                    (Value::String(haystack), Value::String(needle)) => {
                        let matched = match op {
                            BinaryOperator::StartsWith => haystack.starts_with(needle.as_str()),
                            BinaryOperator::EndsWith => haystack.ends_with(needle.as_str()),
                            _ => haystack.contains(needle.as_str()),
                        };
                        Ok(Value::Boolean(matched))
                    }
                    _ => Err(invalid_operands(op.as_str(), &left, Some(&right))),
                }
            }
        }
    }

    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::Not => match operand {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                _ => Err(invalid_operands(op.as_str(), &operand, None)),
            },

            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

            UnaryOperator::IsTrue => match operand {
                Value::Null => Ok(Value::Boolean(false)),
                Value::Boolean(b) => Ok(Value::Boolean(b)),
                _ => Err(invalid_operands(op.as_str(), &operand, None)),
            },

            UnaryOperator::Lower => match operand {
                Value::Null => Ok(Value::Null),
                Value::String(s) => Ok(Value::String(s.to_lowercase())),
                _ => Err(invalid_operands(op.as_str(), &operand, None)),
            },
        }
    }

    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        let ordering = self.order(left, right, op.as_str())?;
        Ok(Value::Boolean(cmp_fn(ordering)))
    }

    fn order(&self, left: &Value, right: &Value, operator: &str) -> ExpressionResult<Ordering> {
        left.compare(right)
            .ok_or_else(|| invalid_operands(operator, left, Some(right)))
    }
}

fn invalid_operands(operator: &str, left: &Value, right: Option<&Value>) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: operator.to_string(),
        left_type: left.data_type(),
        right_type: right.and_then(Value::data_type),
    }
}

/// Helper function to evaluate an expression against row values
pub fn evaluate_expression(expr: &Expression, row: &[Value]) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(row).evaluate(expr)
}

/// Evaluate a bound predicate; NULL counts as not matching
pub fn evaluate_predicate(expr: &Expression, row: &[Value]) -> ExpressionResult<bool> {
    match evaluate_expression(expr, row)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(ExpressionError::EvaluationError {
            message: format!("predicate produced non-boolean value {}", other),
        }),
    }
}
