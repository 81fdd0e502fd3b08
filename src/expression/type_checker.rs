//! Type checking for bound predicates.

use crate::access::DataType;
use crate::expression::operator::types_comparable;
use crate::expression::{Expression, ExpressionError, ExpressionResult};

/// Type checker for expressions
pub struct TypeChecker<'a> {
    /// Schema defining the types of input columns
    schema: &'a [DataType],
}

impl<'a> TypeChecker<'a> {
    pub fn new(schema: &'a [DataType]) -> Self {
        Self { schema }
    }

    /// Type check an expression and return its output type
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<DataType>> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.data_type()),

            Expression::ColumnRef(col) => {
                let index = col.index.ok_or_else(|| ExpressionError::UnboundColumn {
                    name: col.name.clone(),
                })?;
                self.schema
                    .get(index)
                    .copied()
                    .map(Some)
                    .ok_or(ExpressionError::ColumnIndexOutOfBounds {
                        index,
                        row_size: self.schema.len(),
                    })
            }

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(lt, rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }),
                    },
                    // NULL literals are handled at runtime
                    _ if op.is_comparison() => Ok(Some(DataType::Boolean)),
                    _ => Ok(None),
                }
            }

            Expression::UnaryOp { op, operand } => match self.check(operand)? {
                Some(ot) => match op.output_type(ot) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: Some(ot),
                        right_type: None,
                    }),
                },
                None => Ok(op.output_type(DataType::Boolean)),
            },

            Expression::In { expr, list } => {
                let expr_type = self.check(expr)?;
                for item in list {
                    self.check_comparable("IN", expr_type, self.check(item)?)?;
                }
                Ok(Some(DataType::Boolean))
            }

            Expression::Between { expr, low, high } => {
                let expr_type = self.check(expr)?;
                self.check_comparable("BETWEEN", expr_type, self.check(low)?)?;
                self.check_comparable("BETWEEN", expr_type, self.check(high)?)?;
                Ok(Some(DataType::Boolean))
            }
        }
    }

    fn check_comparable(
        &self,
        operator: &str,
        left: Option<DataType>,
        right: Option<DataType>,
    ) -> ExpressionResult<()> {
        match (left, right) {
            (Some(l), Some(r)) if !types_comparable(l, r) => {
                Err(ExpressionError::InvalidOperandTypes {
                    operator: operator.to_string(),
                    left_type: Some(l),
                    right_type: Some(r),
                })
            }
            _ => Ok(()),
        }
    }

    /// Check if an expression is valid for use as a filter predicate
    pub fn check_filter_predicate(&self, expr: &Expression) -> ExpressionResult<()> {
        match self.check(expr)? {
            Some(DataType::Boolean) | None => Ok(()),
            Some(other_type) => Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: other_type,
                context: "filter predicate".to_string(),
            }),
        }
    }
}

/// Helper function to validate a filter predicate
pub fn validate_filter_predicate(expr: &Expression, schema: &[DataType]) -> ExpressionResult<()> {
    TypeChecker::new(schema).check_filter_predicate(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Value;

    #[test]
    fn test_column_ref_type_checking() -> ExpressionResult<()> {
        let schema = vec![DataType::Int32, DataType::Varchar];
        let checker = TypeChecker::new(&schema);

        assert_eq!(
            checker.check(&Expression::bound_column(1, "title"))?,
            Some(DataType::Varchar)
        );
        assert!(matches!(
            checker.check(&Expression::bound_column(2, "x")),
            Err(ExpressionError::ColumnIndexOutOfBounds { .. })
        ));
        assert!(matches!(
            checker.check(&Expression::column("title")),
            Err(ExpressionError::UnboundColumn { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_comparison_allows_numeric_widening() -> ExpressionResult<()> {
        let schema = vec![DataType::Int64];
        let checker = TypeChecker::new(&schema);
        let expr = Expression::gt(
            Expression::bound_column(0, "pages"),
            Expression::literal(Value::Int32(10)),
        );
        assert_eq!(checker.check(&expr)?, Some(DataType::Boolean));
        Ok(())
    }

    #[test]
    fn test_in_list_element_types() {
        let schema = vec![DataType::Varchar];
        let checker = TypeChecker::new(&schema);
        let expr = Expression::in_list(
            Expression::bound_column(0, "title"),
            vec![Expression::literal(Value::Int32(1))],
        );
        assert!(matches!(
            checker.check(&expr),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));
    }

    #[test]
    fn test_filter_predicate_validation() {
        let schema = vec![DataType::Int32, DataType::Boolean];

        let valid = Expression::and(
            Expression::bound_column(1, "active"),
            Expression::is_null(Expression::bound_column(0, "n")),
        );
        assert!(validate_filter_predicate(&valid, &schema).is_ok());

        let invalid = Expression::bound_column(0, "n");
        assert!(matches!(
            validate_filter_predicate(&invalid, &schema),
            Err(ExpressionError::TypeMismatch { .. })
        ));

        let null_eq = Expression::eq(
            Expression::bound_column(0, "n"),
            Expression::literal(Value::Null),
        );
        assert!(validate_filter_predicate(&null_eq, &schema).is_ok());
    }
}
