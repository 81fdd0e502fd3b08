//! Compiles filter trees into store predicates.

use crate::access::Value;
use crate::catalog::JoinStep;
use crate::error::{SearchError, SearchResult};
use crate::expression::Expression;
use crate::filter::node::{FieldNode, FilterNode, LiteralNode};
use crate::filter::operator::{Arity, Operator};
use crate::filter::transform::FieldValueTransformer;
use log::debug;

/// Output of one compilation
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub predicate: Expression,
    /// The filter asked for de-duplicated results
    pub distinct: bool,
    /// Associations the predicate reads, deduplicated, in first-use order
    pub joins: Vec<JoinStep>,
}

/// Single-use compiler; the remapped-field stack and join list live for one call.
pub struct PredicateCompiler<'a> {
    transformer: &'a dyn FieldValueTransformer,
    field_stack: Vec<String>,
    distinct: bool,
    joins: Vec<JoinStep>,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(transformer: &'a dyn FieldValueTransformer) -> Self {
        Self {
            transformer,
            field_stack: Vec::new(),
            distinct: false,
            joins: Vec::new(),
        }
    }

    /// Compile a single tree
    pub fn compile(mut self, node: &FilterNode) -> SearchResult<CompiledFilter> {
        let predicate = self.visit(node)?;
        Ok(self.finish(predicate))
    }

    /// Compile filter groups into one predicate: OR across groups, match-all when empty
    pub fn compile_groups(mut self, groups: &[FilterNode]) -> SearchResult<CompiledFilter> {
        let mut predicate: Option<Expression> = None;
        for group in groups {
            let compiled = self.visit(group)?;
            predicate = Some(match predicate {
                Some(acc) => Expression::or(acc, compiled),
                None => compiled,
            });
        }
        Ok(self.finish(predicate.unwrap_or_else(Expression::match_all)))
    }

    fn finish(self, predicate: Expression) -> CompiledFilter {
        debug!("compiled predicate: {}", predicate);
        CompiledFilter {
            predicate,
            distinct: self.distinct,
            joins: self.joins,
        }
    }

    fn visit(&mut self, node: &FilterNode) -> SearchResult<Expression> {
        match node {
            FilterNode::Compound { op, left, right } => {
                if op.arity() != Arity::Compound {
                    return Err(wrong_arity(*op, "compound"));
                }
                let left = self.visit(left)?;
                let right = self.visit(right)?;
                match op {
                    Operator::And => Ok(Expression::and(left, right)),
                    Operator::Or => Ok(Expression::or(left, right)),
                    Operator::Distinct => {
                        self.distinct = true;
                        Ok(Expression::and(left, right))
                    }
                    other => Err(wrong_arity(*other, "compound")),
                }
            }
            FilterNode::Unary { op, operand } => match op {
                // Two-valued: a row whose operand is NULL satisfies the negation
                Operator::Not => Ok(Expression::not_expr(Expression::is_true(
                    self.visit(operand)?,
                ))),
                other => Err(wrong_arity(*other, "unary")),
            },
            FilterNode::Binary { op, field, literal } => self.visit_binary(*op, field, literal),
            FilterNode::Field(field) => Err(SearchError::InvalidNode(format!(
                "field '{}' in predicate position",
                field.field.path
            ))),
            FilterNode::Literal(literal) => Err(SearchError::InvalidNode(format!(
                "literal {} in predicate position",
                literal.value
            ))),
        }
    }

    fn visit_binary(
        &mut self,
        op: Operator,
        field: &FieldNode,
        literal: &LiteralNode,
    ) -> SearchResult<Expression> {
        if op.arity() != Arity::Binary {
            return Err(wrong_arity(op, "binary"));
        }
        let path = field.field.path.to_string();
        if !op.accepts(field.data_type.category()) {
            return Err(SearchError::type_mismatch(
                &path,
                format!("operator '{}' does not apply to {}", op, field.data_type),
            ));
        }

        let column = Expression::column(self.column_name(field));
        let value = self.literal_value(&literal.value);

        let expr = match op {
            Operator::Equals | Operator::Eq if value.is_null() => Expression::is_null(column),
            Operator::Equals | Operator::Eq => Expression::eq(column, Expression::literal(value)),
            Operator::EqualsIc => Expression::eq(lower(column), lower(Expression::literal(value))),
            Operator::Contains => Expression::contains(column, Expression::literal(value)),
            Operator::ContainsIc => {
                Expression::contains(lower(column), lower(Expression::literal(value)))
            }
            Operator::Starts => Expression::starts_with(column, Expression::literal(value)),
            Operator::StartsIc => {
                Expression::starts_with(lower(column), lower(Expression::literal(value)))
            }
            Operator::Ends => Expression::ends_with(column, Expression::literal(value)),
            Operator::EndsIc => {
                Expression::ends_with(lower(column), lower(Expression::literal(value)))
            }
            Operator::Gt => Expression::gt(column, Expression::literal(value)),
            Operator::Gte => Expression::ge(column, Expression::literal(value)),
            Operator::Lt => Expression::lt(column, Expression::literal(value)),
            Operator::Lte => Expression::le(column, Expression::literal(value)),
            Operator::In => match value {
                Value::List(items) => {
                    Expression::in_list(column, items.into_iter().map(Expression::literal).collect())
                }
                other => {
                    return Err(SearchError::InvalidNode(format!(
                        "'in' on '{}' needs a list literal, got {}",
                        path, other
                    )))
                }
            },
            Operator::Between => match value {
                Value::List(items) if items.len() >= 2 => {
                    let mut bounds = items.into_iter();
                    let (low, high) = match (bounds.next(), bounds.next()) {
                        (Some(low), Some(high)) => (low, high),
                        _ => return Err(SearchError::InvalidNode("between bounds".into())),
                    };
                    Expression::between(column, Expression::literal(low), Expression::literal(high))
                }
                other => {
                    return Err(SearchError::InvalidNode(format!(
                        "'between' on '{}' needs two bounds, got {}",
                        path, other
                    )))
                }
            },
            Operator::And | Operator::Or | Operator::Not | Operator::Distinct => {
                return Err(wrong_arity(op, "binary"))
            }
        };

        self.record_joins(&field.field.joins);
        Ok(expr)
    }

    /// Column name in the joined row layout: declared override, else the remapping hook,
    /// else the attribute name, qualified by the association path it is read from.
    fn column_name(&mut self, field: &FieldNode) -> String {
        let resolved = &field.field;
        let column = if resolved.overridden {
            resolved.column.clone()
        } else {
            match self
                .transformer
                .transform_field(&resolved.owner, &resolved.attribute)
            {
                Some(mapped) => {
                    self.field_stack.push(resolved.attribute.clone());
                    mapped
                }
                None => resolved.column.clone(),
            }
        };

        match resolved.source_path() {
            Some(source) => format!("{}.{}", source, column),
            None => column,
        }
    }

    fn literal_value(&mut self, value: &Value) -> Value {
        let Some(field) = self.field_stack.pop() else {
            return value.clone();
        };
        match self.transformer.transform_value(&field, value) {
            Some(pair) if !pair.value.is_null() => pair.value,
            _ => value.clone(),
        }
    }

    fn record_joins(&mut self, joins: &[JoinStep]) {
        for join in joins {
            if !self.joins.iter().any(|j| j.path == join.path) {
                self.joins.push(join.clone());
            }
        }
    }
}

fn lower(expr: Expression) -> Expression {
    Expression::lower(expr)
}

fn wrong_arity(op: Operator, position: &str) -> SearchError {
    SearchError::InvalidNode(format!(
        "operator '{}' ({:?}) cannot appear in a {} node",
        op,
        op.arity(),
        position
    ))
}
