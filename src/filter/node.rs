//! Typed filter tree.
//!
//! Built by the parser from an untyped filter map, consumed by the predicate
//! compiler. A tree is immutable once built and owned by one request.

use crate::access::{DataType, Value};
use crate::catalog::ResolvedField;
use crate::filter::operator::Operator;
use std::fmt;

/// A resolved scalar field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub field: ResolvedField,
    pub data_type: DataType,
}

impl FieldNode {
    pub fn new(field: ResolvedField, data_type: DataType) -> Self {
        Self { field, data_type }
    }
}

/// A literal already coerced to its field's type; `in`/`between` carry a `Value::List`
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    pub value: Value,
}

impl LiteralNode {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Field(FieldNode),
    Literal(LiteralNode),
    Binary {
        op: Operator,
        field: FieldNode,
        literal: LiteralNode,
    },
    Unary {
        op: Operator,
        operand: Box<FilterNode>,
    },
    Compound {
        op: Operator,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
}

impl FilterNode {
    pub fn binary(op: Operator, field: FieldNode, literal: LiteralNode) -> Self {
        FilterNode::Binary { op, field, literal }
    }

    pub fn unary(op: Operator, operand: FilterNode) -> Self {
        FilterNode::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn compound(op: Operator, left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Compound {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Left-fold `nodes` with a compound operator.
    ///
    /// A single node under `and`/`or` is returned as is; under `distinct` it is
    /// paired with itself so the de-duplication request survives.
    pub fn fold(op: Operator, nodes: Vec<FilterNode>) -> Option<FilterNode> {
        let mut nodes = nodes.into_iter();
        let first = nodes.next()?;
        let mut rest = nodes.peekable();

        if rest.peek().is_none() {
            return Some(match op {
                Operator::Distinct => FilterNode::compound(op, first.clone(), first),
                _ => first,
            });
        }
        Some(rest.fold(first, |acc, node| FilterNode::compound(op, acc, node)))
    }

    /// True for binary `eq`/`equals` leaves joined only by `and`
    pub fn is_equality_conjunction(&self) -> bool {
        match self {
            FilterNode::Binary { op, literal, .. } => {
                matches!(op, Operator::Eq | Operator::Equals) && !literal.value.is_null()
            }
            FilterNode::Compound {
                op: Operator::And,
                left,
                right,
            } => left.is_equality_conjunction() && right.is_equality_conjunction(),
            _ => false,
        }
    }

    /// Every field referenced in the tree, left to right
    pub fn fields(&self) -> Vec<&FieldNode> {
        match self {
            FilterNode::Field(field) => vec![field],
            FilterNode::Literal(_) => Vec::new(),
            FilterNode::Binary { field, .. } => vec![field],
            FilterNode::Unary { operand, .. } => operand.fields(),
            FilterNode::Compound { left, right, .. } => {
                let mut fields = left.fields();
                fields.extend(right.fields());
                fields
            }
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Field(field) => write!(f, "{}", field.field.path),
            FilterNode::Literal(literal) => write!(f, "{}", literal.value),
            FilterNode::Binary { op, field, literal } => {
                write!(f, "{} {} {}", field.field.path, op, literal.value)
            }
            FilterNode::Unary { op, operand } => write!(f, "{}({})", op, operand),
            FilterNode::Compound { op, left, right } => write!(f, "{}({}, {})", op, left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;
    use crate::error::SearchResult;

    fn leaf(path: &str, op: Operator, value: Value) -> SearchResult<FilterNode> {
        let catalog = library_catalog()?;
        let field = catalog.resolver().resolve_str("Book", path)?;
        let data_type = field.data_type().unwrap_or(DataType::Varchar);
        Ok(FilterNode::binary(
            op,
            FieldNode::new(field, data_type),
            LiteralNode::new(value),
        ))
    }

    #[test]
    fn test_fold_left_associates() -> SearchResult<()> {
        let a = leaf("title", Operator::Equals, Value::String("Dune".into()))?;
        let b = leaf("pages", Operator::Gt, Value::Int32(100))?;
        let c = leaf("price", Operator::Lt, Value::Float64(10.0))?;

        let folded = FilterNode::fold(Operator::And, vec![a, b, c]);
        assert_eq!(
            folded.map(|n| n.to_string()),
            Some("and(and(title equals 'Dune', pages gt 100), price lt 10)".to_string())
        );
        assert!(FilterNode::fold(Operator::Or, Vec::new()).is_none());
        Ok(())
    }

    #[test]
    fn test_single_node_fold() -> SearchResult<()> {
        let a = leaf("title", Operator::Equals, Value::String("Dune".into()))?;

        assert_eq!(FilterNode::fold(Operator::Or, vec![a.clone()]), Some(a.clone()));
        match FilterNode::fold(Operator::Distinct, vec![a.clone()]) {
            Some(FilterNode::Compound { op, left, right }) => {
                assert_eq!(op, Operator::Distinct);
                assert_eq!(*left, a);
                assert_eq!(*right, a);
            }
            other => panic!("unexpected fold result {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_equality_conjunction() -> SearchResult<()> {
        let a = leaf("title", Operator::Equals, Value::String("Dune".into()))?;
        let b = leaf("pages", Operator::Eq, Value::Int32(412))?;
        let c = leaf("price", Operator::Gt, Value::Float64(1.0))?;
        let null = leaf("isbn", Operator::Eq, Value::Null)?;

        assert!(FilterNode::compound(Operator::And, a.clone(), b.clone()).is_equality_conjunction());
        assert!(!FilterNode::compound(Operator::Or, a.clone(), b).is_equality_conjunction());
        assert!(!FilterNode::compound(Operator::And, a.clone(), c).is_equality_conjunction());
        assert!(!FilterNode::unary(Operator::Not, a).is_equality_conjunction());
        assert!(!null.is_equality_conjunction());
        Ok(())
    }

    #[test]
    fn test_fields_in_order() -> SearchResult<()> {
        let a = leaf("author.name", Operator::Equals, Value::String("Herbert".into()))?;
        let b = leaf("title", Operator::Contains, Value::String("Du".into()))?;
        let node = FilterNode::unary(Operator::Not, FilterNode::compound(Operator::Or, a, b));

        let paths: Vec<String> = node.fields().iter().map(|f| f.field.path.to_string()).collect();
        assert_eq!(paths, vec!["author.name", "title"]);
        Ok(())
    }
}
