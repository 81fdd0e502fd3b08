//! Parser from untyped JSON filter maps to typed filter trees.
//!
//! Shape of a filter map:
//!
//! ```text
//! { "and": [ {..}, {..} ] }                      logical operator over sub-maps
//! { "author": { "name": { "starts": "J" } } }    association -> nested map
//! { "price": { "gt": 5, "lte": 20 } }            scalar -> operator map
//! { "title": "Dune" }                            scalar -> bare literal (eq)
//! ```
//!
//! Every key of one object contributes a node; the nodes are folded with the
//! object's first logical key, or `and` when it has none.

use crate::access::{DataType, Value};
use crate::catalog::{EntityMetadataProvider, FieldPath, FieldPathResolver, ResolvedField};
use crate::error::{SearchError, SearchResult};
use crate::filter::node::{FieldNode, FilterNode, LiteralNode};
use crate::filter::operator::Operator;
use log::trace;
use serde_json::{Map, Value as Json};

/// Builds filter trees for one root entity
pub struct FilterMapParser<'a, P: EntityMetadataProvider + ?Sized> {
    provider: &'a P,
    resolver: FieldPathResolver<'a, P>,
    root: &'a str,
}

impl<'a, P: EntityMetadataProvider + ?Sized> FilterMapParser<'a, P> {
    pub fn new(provider: &'a P, root: &'a str) -> Self {
        Self {
            provider,
            resolver: FieldPathResolver::new(provider),
            root,
        }
    }

    /// Parse one filter group. An empty object places no constraint.
    pub fn parse(&self, filter: &Json) -> SearchResult<Option<FilterNode>> {
        let object = filter
            .as_object()
            .ok_or_else(|| SearchError::malformed("", "filter must be a JSON object"))?;
        if object.is_empty() {
            return Ok(None);
        }
        let node = self.parse_object(object, None)?;
        trace!("parsed filter for {}: {}", self.root, node);
        Ok(Some(node))
    }

    fn parse_object(
        &self,
        object: &Map<String, Json>,
        prefix: Option<&FieldPath>,
    ) -> SearchResult<FilterNode> {
        let here = prefix.map(|p| p.to_string()).unwrap_or_default();
        if object.is_empty() {
            return Err(SearchError::malformed(&here, "empty filter object"));
        }

        let mut combining = None;
        let mut nodes = Vec::with_capacity(object.len());

        for (key, value) in object {
            match key.parse::<Operator>() {
                Ok(op) if op.is_logical() => {
                    combining.get_or_insert(op);
                    nodes.push(self.parse_logical(op, value, prefix)?);
                }
                Ok(op) => {
                    return Err(SearchError::malformed(
                        &here,
                        format!("operator '{}' must be applied to a field", op),
                    ))
                }
                Err(_) => nodes.push(self.parse_field(key, value, prefix)?),
            }
        }

        if nodes.len() == 1 {
            return Ok(nodes.remove(0));
        }
        let combining = match combining {
            Some(Operator::Distinct) => Operator::Distinct,
            Some(Operator::Or) => Operator::Or,
            _ => Operator::And,
        };
        FilterNode::fold(combining, nodes)
            .ok_or_else(|| SearchError::malformed(&here, "empty filter object"))
    }

    fn parse_logical(
        &self,
        op: Operator,
        value: &Json,
        prefix: Option<&FieldPath>,
    ) -> SearchResult<FilterNode> {
        let here = prefix.map(|p| p.to_string()).unwrap_or_default();
        let items = value.as_array().ok_or_else(|| {
            SearchError::malformed(&here, format!("'{}' expects an array of filter objects", op))
        })?;

        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let object = item.as_object().ok_or_else(|| {
                SearchError::malformed(&here, format!("'{}' items must be objects", op))
            })?;
            children.push(self.parse_object(object, prefix)?);
        }

        let folded = match op {
            Operator::Not => FilterNode::fold(Operator::And, children)
                .map(|child| FilterNode::unary(Operator::Not, child)),
            _ => FilterNode::fold(op, children),
        };
        folded.ok_or_else(|| SearchError::malformed(&here, format!("'{}' has no operands", op)))
    }

    fn parse_field(
        &self,
        key: &str,
        value: &Json,
        prefix: Option<&FieldPath>,
    ) -> SearchResult<FilterNode> {
        // A leading root path such as `book` addresses the root entity itself
        if prefix.is_none() && self.is_root_path(key) {
            let object = value.as_object().ok_or_else(|| {
                SearchError::malformed(key, "root path expects a nested filter object")
            })?;
            return self.parse_object(object, None);
        }

        let path = FieldPath::extend(prefix, key);
        let field = self.resolver.resolve(self.root, &path)?;
        let path_str = path.to_string();

        match field.data_type() {
            None => {
                let object = value.as_object().ok_or_else(|| {
                    SearchError::malformed(&path_str, "association expects a nested filter object")
                })?;
                self.parse_object(object, Some(&path))
            }
            Some(data_type) => self.parse_scalar(field, data_type, value),
        }
    }

    fn is_root_path(&self, key: &str) -> bool {
        self.resolver.find_attribute(self.root, key).is_none()
            && self
                .provider
                .entity(self.root)
                .is_some_and(|meta| meta.root_paths.iter().any(|p| p == key))
    }

    fn parse_scalar(
        &self,
        field: ResolvedField,
        data_type: DataType,
        value: &Json,
    ) -> SearchResult<FilterNode> {
        let path = field.path.to_string();

        let operations: Vec<(Operator, &Json)> = match value {
            Json::Object(map) => {
                if map.is_empty() {
                    return Err(SearchError::malformed(&path, "empty operator object"));
                }
                map.iter()
                    .map(|(name, literal)| {
                        name.parse::<Operator>()
                            .map(|op| (op, literal))
                            .map_err(|_| {
                                SearchError::malformed(
                                    &path,
                                    format!("unrecognised operator '{}'", name),
                                )
                            })
                    })
                    .collect::<SearchResult<_>>()?
            }
            Json::Array(_) => {
                return Err(SearchError::malformed(
                    &path,
                    "a bare array needs an operator such as 'in'",
                ))
            }
            literal => vec![(Operator::Eq, literal)],
        };

        let mut nodes = Vec::with_capacity(operations.len());
        for (op, literal) in operations {
            if op.is_logical() {
                return Err(SearchError::type_mismatch(
                    &path,
                    format!("logical operator '{}' cannot be applied to a field", op),
                ));
            }
            if !op.accepts(data_type.category()) {
                return Err(SearchError::type_mismatch(
                    &path,
                    format!("operator '{}' does not apply to {}", op, data_type),
                ));
            }
            let literal = coerce_literal(op, &path, literal, data_type)?;
            nodes.push(FilterNode::binary(
                op,
                FieldNode::new(field.clone(), data_type),
                literal,
            ));
        }

        FilterNode::fold(Operator::And, nodes)
            .ok_or_else(|| SearchError::malformed(&path, "empty operator object"))
    }
}

/// Coerce the literal of `op` to the field type
pub(crate) fn coerce_literal(
    op: Operator,
    path: &str,
    literal: &Json,
    data_type: DataType,
) -> SearchResult<LiteralNode> {
    // Range bounds on an integer field may be fractional: `pages gt 10.5`
    let ordering = matches!(
        op,
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Between
    ) && matches!(data_type, DataType::Int32 | DataType::Int64);
    let coerce = |json: &Json| {
        Value::from_json(json, data_type)
            .or_else(|| {
                ordering
                    .then(|| Value::from_json(json, DataType::Float64))
                    .flatten()
            })
            .ok_or_else(|| SearchError::literal_mismatch(path, json, data_type))
    };

    match op {
        Operator::In | Operator::Between => {
            let items = literal.as_array().ok_or_else(|| {
                SearchError::malformed(path, format!("'{}' expects an array", op))
            })?;
            if op == Operator::Between && items.len() < 2 {
                return Err(SearchError::malformed(
                    path,
                    "'between' expects at least two values",
                ));
            }
            let values = items.iter().map(coerce).collect::<SearchResult<Vec<_>>>()?;
            Ok(LiteralNode::new(Value::List(values)))
        }
        _ => match literal {
            Json::Array(_) | Json::Object(_) => Err(SearchError::malformed(
                path,
                format!("'{}' expects a single value", op),
            )),
            json => coerce(json).map(LiteralNode::new),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;
    use crate::catalog::Catalog;
    use serde_json::json;

    fn parse(catalog: &Catalog, root: &str, filter: Json) -> SearchResult<Option<FilterNode>> {
        FilterMapParser::new(catalog, root).parse(&filter)
    }

    fn render(catalog: &Catalog, filter: Json) -> SearchResult<String> {
        Ok(parse(catalog, "Book", filter)?
            .map(|n| n.to_string())
            .unwrap_or_default())
    }

    #[test]
    fn test_operator_map_and_bare_literal() -> SearchResult<()> {
        let catalog = library_catalog()?;
        assert_eq!(
            render(&catalog, json!({"title": {"contains": "Harry"}}))?,
            "title contains 'Harry'"
        );
        assert_eq!(render(&catalog, json!({"pages": 412}))?, "pages eq 412");
        assert_eq!(
            render(&catalog, json!({"price": {"gt": 5, "LTE": 20}}))?,
            "and(price gt 5, price lte 20)"
        );
        Ok(())
    }

    #[test]
    fn test_logical_operators() -> SearchResult<()> {
        let catalog = library_catalog()?;
        assert_eq!(
            render(
                &catalog,
                json!({"or": [{"pages": {"lt": 100}}, {"pages": {"gt": 900}}]})
            )?,
            "or(pages lt 100, pages gt 900)"
        );
        assert_eq!(
            render(&catalog, json!({"not": [{"title": "Dune"}, {"pages": 1}]}))?,
            "not(and(title eq 'Dune', pages eq 1))"
        );
        // Sibling keys fold with the first logical key of the object
        assert_eq!(
            render(
                &catalog,
                json!({"or": [{"pages": 1}, {"pages": 2}], "title": "Dune"})
            )?,
            "or(or(pages eq 1, pages eq 2), title eq 'Dune')"
        );
        Ok(())
    }

    #[test]
    fn test_distinct_marks_the_tree() -> SearchResult<()> {
        let catalog = library_catalog()?;
        assert_eq!(
            render(&catalog, json!({"distinct": [{"title": "Dune"}]}))?,
            "distinct(title eq 'Dune', title eq 'Dune')"
        );
        Ok(())
    }

    #[test]
    fn test_nested_association_and_root_path() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let node = parse(
            &catalog,
            "Book",
            json!({"book": {"author": {"publisher": {"name": {"startsic": "pen"}}}}}),
        )?;
        let node = node.ok_or_else(|| SearchError::InvalidNode("missing".into()))?;
        assert_eq!(node.to_string(), "author.publisher.name startsic 'pen'");

        let fields = node.fields();
        assert_eq!(fields[0].field.joins.len(), 2);
        Ok(())
    }

    #[test]
    fn test_literals_coerced_to_declared_type() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let node = parse(
            &catalog,
            "Book",
            json!({"published": {"between": ["1960-01-01", "1970-12-31"]}}),
        )?;
        match node {
            Some(FilterNode::Binary { literal, .. }) => match literal.value {
                Value::List(items) => {
                    assert!(matches!(items[0], Value::Date(_)));
                    assert_eq!(items.len(), 2);
                }
                other => panic!("expected list literal, got {:?}", other),
            },
            other => panic!("expected binary node, got {:?}", other),
        }

        assert!(matches!(
            parse(&catalog, "Book", json!({"pages": {"gt": "many"}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        assert!(matches!(
            parse(&catalog, "Book", json!({"pages": {"eq": 10.5}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        match parse(&catalog, "Book", json!({"pages": {"gt": 10.5}}))? {
            Some(FilterNode::Binary { literal, .. }) => {
                assert_eq!(literal.value, Value::Float64(10.5))
            }
            other => panic!("expected binary node, got {:?}", other),
        }
        assert!(matches!(
            parse(&catalog, "Book", json!({"isbn": {"eq": "not-a-uuid"}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_operator_category_checked() -> SearchResult<()> {
        let catalog = library_catalog()?;
        assert!(matches!(
            parse(&catalog, "Book", json!({"pages": {"contains": "1"}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        assert!(matches!(
            parse(&catalog, "Book", json!({"title": {"gt": "A"}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        assert!(matches!(
            parse(&catalog, "Book", json!({"title": {"and": []}})),
            Err(SearchError::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_malformed_shapes() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let malformed = [
            json!({"author": "Herbert"}),
            json!({"title": {"like": "x"}}),
            json!({"title": {}}),
            json!({"and": {"title": "x"}}),
            json!({"and": []}),
            json!({"pages": {"in": 3}}),
            json!({"pages": {"between": [1]}}),
            json!({"title": ["a", "b"]}),
            json!({"gt": 3}),
            json!([{"title": "x"}]),
        ];
        for filter in malformed {
            assert!(
                matches!(
                    parse(&catalog, "Book", filter.clone()),
                    Err(SearchError::MalformedFilterShape { .. })
                ),
                "expected malformed for {}",
                filter
            );
        }
        Ok(())
    }

    #[test]
    fn test_unknown_field() -> SearchResult<()> {
        let catalog = library_catalog()?;
        assert!(matches!(
            parse(&catalog, "Book", json!({"unknownField": {"eq": 1}})),
            Err(SearchError::UnresolvableFieldPath { .. })
        ));
        assert!(parse(&catalog, "Book", json!({}))?.is_none());
        Ok(())
    }
}
