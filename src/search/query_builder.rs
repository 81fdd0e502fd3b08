//! Builds a [`QueryPlan`] from a parsed request.
//!
//! One builder serves one call. It resolves every selected, grouped and
//! aggregated path, collects the associations they traverse, and turns those
//! into joins in dependency order.

use crate::access::TypeCategory;
use crate::catalog::{
    AttributeType, Cardinality, Catalog, FieldPath, JoinStep, ResolvedField,
};
use crate::error::{SearchError, SearchResult};
use crate::executor::{AggregateFunction, SortOrder};
use crate::expression::Expression;
use crate::filter::{FieldValueTransformer, PredicateCompiler};
use crate::search::path_format::PathFormatter;
use crate::search::request::{Aggregates, SearchRequest};
use crate::store::{AggregateItem, JoinSpec, OrderItem, PageWindow, ProjectionItem, QueryPlan};
use log::{debug, warn};
use std::collections::HashSet;

/// How result rows map back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Whole root entities, aliased `<root path>.<attribute>`
    Entities,
    /// Flat rows keyed by selection alias
    Rows,
}

#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub plan: QueryPlan,
    pub shape: ResultShape,
}

/// A projected column before aggregation is applied
struct SelectedColumn {
    /// Formatted request path, used to match aggregate lists
    path: String,
    column: String,
    alias: String,
    order: Option<(i32, SortOrder)>,
}

pub struct QueryBuilder<'a> {
    catalog: &'a Catalog,
    root: &'a str,
    formatter: &'a PathFormatter,
    transformer: &'a dyn FieldValueTransformer,
    joins: Vec<JoinStep>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        catalog: &'a Catalog,
        root: &'a str,
        formatter: &'a PathFormatter,
        transformer: &'a dyn FieldValueTransformer,
    ) -> Self {
        Self {
            catalog,
            root,
            formatter,
            transformer,
            joins: Vec::new(),
        }
    }

    pub fn build(mut self, request: &SearchRequest, page: Option<PageWindow>) -> SearchResult<BuiltQuery> {
        let catalog = self.catalog;
        let resolver = catalog.resolver();
        let meta = catalog.get_entity(self.root)?;
        let id = resolver.id_attribute(self.root)?;
        let mut plan = QueryPlan::new(
            self.root,
            meta.table_name(),
            resolver.column_name(self.root, &id.name),
        );

        let compiled = PredicateCompiler::new(self.transformer).compile_groups(&request.filter_groups)?;
        let mut predicate = compiled.predicate;
        let mut distinct = compiled.distinct;
        self.add_joins(&compiled.joins);

        if let Some(parameters) = &request.parameters {
            let compiled = PredicateCompiler::new(self.transformer).compile(parameters)?;
            predicate = Expression::and(predicate, compiled.predicate);
            distinct |= compiled.distinct;
            self.add_joins(&compiled.joins);
        }

        let shape = if request.selections.is_empty() && request.aggregates.is_none() {
            self.project_entity(&mut plan)?;
            ResultShape::Entities
        } else {
            let columns = self.select_columns(request)?;
            match &request.aggregates {
                Some(aggregates) => self.project_aggregates(&mut plan, columns, aggregates)?,
                None => Self::project_rows(&mut plan, columns)?,
            }
            ResultShape::Rows
        };

        plan.joins = self
            .joins
            .iter()
            .map(|step| self.join_spec(step))
            .collect::<SearchResult<Vec<_>>>()?;
        // Whole entities must not repeat because a to-many filter join fanned out
        plan.distinct = distinct || (shape == ResultShape::Entities && plan.has_to_many_join());
        plan.predicate = predicate;
        plan.page = page;

        debug!("Built plan for {}: {}", self.root, plan);
        Ok(BuiltQuery { plan, shape })
    }

    /// Resolve a requested path, accepting a leading root path segment
    pub fn resolve(&self, path: &str) -> SearchResult<ResolvedField> {
        let formatted = self.formatter.format(path);
        let parsed = FieldPath::parse(&formatted).ok_or_else(|| SearchError::UnresolvableFieldPath {
            entity: self.root.to_string(),
            path: path.to_string(),
        })?;
        let resolver = self.catalog.resolver();
        let first = parsed.segments()[0].as_str();
        let is_root_path = resolver.find_attribute(self.root, first).is_none()
            && self
                .catalog
                .get_entity(self.root)?
                .root_paths
                .iter()
                .any(|p| p == first);
        let parsed = match is_root_path {
            true => parsed.skip(1).unwrap_or(parsed),
            false => parsed,
        };
        resolver.resolve(self.root, &parsed)
    }

    fn add_joins(&mut self, steps: &[JoinStep]) {
        for step in steps {
            if !self.joins.iter().any(|j| j.path == step.path) {
                self.joins.push(step.clone());
            }
        }
    }

    /// Root scalars plus the scalars of every directly reachable to-one association
    fn project_entity(&mut self, plan: &mut QueryPlan) -> SearchResult<()> {
        let catalog = self.catalog;
        let resolver = catalog.resolver();
        let root_path = catalog.get_entity(self.root)?.primary_root_path();

        for field in resolver.scalar_fields(self.root, None)? {
            plan.projection.push(ProjectionItem::new(
                field.column_path(),
                format!("{}.{}", root_path, field.attribute),
            ));
        }

        for attribute in resolver.visible_attributes(self.root) {
            let is_to_one = matches!(
                &attribute.attr_type,
                AttributeType::Association {
                    cardinality: Cardinality::ToOne { .. },
                    ..
                }
            );
            if !is_to_one || resolver.find_override(self.root, &attribute.name).is_some() {
                continue;
            }
            let prefix = FieldPath::single(attribute.name.as_str());
            for field in resolver.scalar_fields(self.root, Some(&prefix))? {
                self.add_joins(&field.joins);
                plan.projection.push(ProjectionItem::new(
                    field.column_path(),
                    format!("{}.{}", root_path, field.path),
                ));
            }
        }

        // Stable pages need a total order
        let id = resolver.id_attribute(self.root)?;
        plan.order_by.push(OrderItem {
            alias: format!("{}.{}", root_path, id.name),
            direction: SortOrder::Asc,
        });
        Ok(())
    }

    /// Resolve selections; a complex selection expands to its target's scalars
    fn select_columns(&mut self, request: &SearchRequest) -> SearchResult<Vec<SelectedColumn>> {
        let catalog = self.catalog;
        let resolver = catalog.resolver();
        let mut columns = Vec::new();

        for selection in &request.selections {
            let path = self.formatter.format(&selection.path);
            let field = self.resolve(&path)?;
            let alias = selection.alias.clone().unwrap_or_else(|| path.clone());

            if field.is_complex() {
                for sub in resolver.scalar_fields(self.root, Some(&field.path))? {
                    self.add_joins(&sub.joins);
                    columns.push(SelectedColumn {
                        path: format!("{}.{}", path, sub.attribute),
                        column: sub.column_path(),
                        alias: format!("{}.{}", alias, sub.attribute),
                        order: None,
                    });
                }
            } else {
                self.add_joins(&field.joins);
                columns.push(SelectedColumn {
                    path,
                    column: field.column_path(),
                    alias,
                    order: selection.priority.map(|p| (p, selection.direction)),
                });
            }
        }
        Ok(columns)
    }

    fn project_rows(plan: &mut QueryPlan, columns: Vec<SelectedColumn>) -> SearchResult<()> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.alias.clone()) {
                return Err(SearchError::DuplicateAlias(column.alias.clone()));
            }
            plan.projection
                .push(ProjectionItem::new(column.column.clone(), column.alias.clone()));
        }
        plan.order_by = Self::ordering(&columns, &seen);
        Ok(())
    }

    /// Group-by columns then aggregate columns; selections that are neither are dropped
    fn project_aggregates(
        &mut self,
        plan: &mut QueryPlan,
        columns: Vec<SelectedColumn>,
        aggregates: &Aggregates,
    ) -> SearchResult<()> {
        let mut seen = HashSet::new();
        let mut push = |plan: &mut QueryPlan, column: String, alias: String| {
            if !seen.insert(alias.clone()) {
                return Err(SearchError::DuplicateAlias(alias));
            }
            plan.projection.push(ProjectionItem::new(column, alias));
            Ok(())
        };

        for path in aggregates.group_by.iter().flatten() {
            let field = self.scalar(path, "cannot group by an association")?;
            let selected = columns.iter().find(|c| &c.path == path);
            let alias = selected.map_or_else(|| path.clone(), |c| c.alias.clone());
            plan.group_by.push(field.column_path());
            push(plan, field.column_path(), alias)?;
        }

        let lists = [
            (AggregateFunction::Count, &aggregates.count),
            (AggregateFunction::Sum, &aggregates.sum),
            (AggregateFunction::Avg, &aggregates.avg),
            (AggregateFunction::Min, &aggregates.min),
            (AggregateFunction::Max, &aggregates.max),
        ];
        for (function, paths) in lists {
            for path in paths {
                let field = self.scalar(path, "cannot aggregate an association")?;
                if function.requires_numeric()
                    && field.data_type().map(|t| t.category()) != Some(TypeCategory::Numeric)
                {
                    return Err(SearchError::type_mismatch(
                        path,
                        format!("{} needs a numeric field", function.name()),
                    ));
                }
                let alias = format!("{}({})", function.name(), path);
                plan.aggregates.push(AggregateItem {
                    function,
                    column: field.column_path(),
                    alias: alias.clone(),
                });
                push(plan, alias.clone(), alias)?;
            }
        }

        let projected: HashSet<String> = plan.projection.iter().map(|p| p.alias.clone()).collect();
        for column in &columns {
            if !projected.contains(&column.alias) && !aggregates.contains(&column.path) {
                warn!(
                    "Dropping '{}' from an aggregate search: it is neither grouped nor aggregated",
                    column.path
                );
            }
        }
        plan.order_by = Self::ordering(&columns, &projected);
        Ok(())
    }

    fn scalar(&mut self, path: &str, reason: &str) -> SearchResult<ResolvedField> {
        let field = self.resolve(path)?;
        if field.is_complex() {
            return Err(SearchError::type_mismatch(path, reason));
        }
        self.add_joins(&field.joins);
        Ok(field)
    }

    /// Prioritised selections in ascending priority; ties keep request order
    fn ordering(columns: &[SelectedColumn], projected: &HashSet<String>) -> Vec<OrderItem> {
        let mut ordered: Vec<(i32, &SelectedColumn)> = columns
            .iter()
            .filter(|c| projected.contains(&c.alias))
            .filter_map(|c| c.order.map(|(priority, _)| (priority, c)))
            .collect();
        ordered.sort_by_key(|(priority, _)| *priority);
        ordered
            .into_iter()
            .filter_map(|(_, c)| {
                c.order.map(|(_, direction)| OrderItem {
                    alias: c.alias.clone(),
                    direction,
                })
            })
            .collect()
    }

    /// Physical join for one traversed association.
    ///
    /// To-one joins match the source's join column against the target id;
    /// to-many joins match the source id against the target's back reference.
    fn join_spec(&self, step: &JoinStep) -> SearchResult<JoinSpec> {
        let resolver = self.catalog.resolver();
        let parent = step.path.rsplit_once('.').map(|(parent, _)| parent);
        let qualify = |column: &str| match parent {
            Some(parent) => format!("{}.{}", parent, column),
            None => column.to_string(),
        };

        let (left_key, right_key, to_many) = match &step.cardinality {
            Cardinality::ToOne { join_column } => {
                let target_id = resolver.id_attribute(&step.target)?;
                (
                    qualify(join_column),
                    resolver.column_name(&step.target, &target_id.name).to_string(),
                    false,
                )
            }
            Cardinality::ToMany { mapped_by } => {
                let source_id = resolver.id_attribute(&step.source)?;
                let back = resolver.resolve(&step.target, &FieldPath::single(mapped_by.as_str()))?;
                let right_key = match resolver.find_attribute(&step.target, mapped_by).map(|a| &a.attr_type) {
                    Some(AttributeType::Association {
                        cardinality: Cardinality::ToOne { join_column },
                        ..
                    }) if !back.overridden => join_column.clone(),
                    _ => back.column,
                };
                (
                    qualify(resolver.column_name(&step.source, &source_id.name)),
                    right_key,
                    true,
                )
            }
        };

        Ok(JoinSpec {
            path: step.path.clone(),
            entity: step.target.clone(),
            table: self.catalog.get_entity(&step.target)?.table_name().to_string(),
            left_key,
            right_key,
            to_many,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;
    use crate::filter::{FilterMapParser, IdentityTransformer};
    use crate::search::request::Selection;
    use serde_json::json;

    fn build(catalog: &Catalog, root: &str, request: &SearchRequest) -> SearchResult<BuiltQuery> {
        let formatter = PathFormatter::default();
        QueryBuilder::new(catalog, root, &formatter, &IdentityTransformer).build(request, None)
    }

    #[test]
    fn test_entity_mode_projects_root_and_to_one() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let built = build(&catalog, "Book", &SearchRequest::new())?;

        assert_eq!(built.shape, ResultShape::Entities);
        let aliases: Vec<&str> = built.plan.projection.iter().map(|p| p.alias.as_str()).collect();
        assert!(aliases.contains(&"book.title"));
        assert!(aliases.contains(&"book.author.name"));
        assert!(!aliases.iter().any(|a| a.starts_with("book.author.publisher")));
        assert_eq!(
            built.plan.join("author").map(|j| (j.left_key.as_str(), j.right_key.as_str())),
            Some(("author_id", "id"))
        );
        assert_eq!(built.plan.order_by[0].alias, "book.id");
        assert!(!built.plan.distinct);
        Ok(())
    }

    #[test]
    fn test_row_mode_aliases_and_order() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let request = SearchRequest::new()
            .select(Selection::new("book.title").ordered(2, SortOrder::Asc))
            .select(Selection::new("data.price").with_alias("cost").ordered(1, SortOrder::Desc))
            .select(Selection::new("author.publisher.name"));
        let built = build(&catalog, "Book", &request)?;

        assert_eq!(built.shape, ResultShape::Rows);
        let projection: Vec<(&str, &str)> = built
            .plan
            .projection
            .iter()
            .map(|p| (p.column.as_str(), p.alias.as_str()))
            .collect();
        assert_eq!(
            projection,
            vec![
                ("title", "book.title"),
                ("price", "cost"),
                ("author.publisher.name", "author.publisher.name"),
            ]
        );
        let order: Vec<&str> = built.plan.order_by.iter().map(|o| o.alias.as_str()).collect();
        assert_eq!(order, vec!["cost", "book.title"]);
        assert_eq!(
            built.plan.join("author.publisher").map(|j| j.left_key.as_str()),
            Some("author.publisher_id")
        );
        Ok(())
    }

    #[test]
    fn test_complex_selection_expands() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let built = build(&catalog, "Book", &SearchRequest::new().select(Selection::new("author")))?;
        let aliases: Vec<&str> = built.plan.projection.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["author.id", "author.name", "author.born"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_alias_rejected() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let request = SearchRequest::new()
            .select(Selection::new("title").with_alias("x"))
            .select(Selection::new("category").with_alias("x"));
        assert!(matches!(
            build(&catalog, "Book", &request),
            Err(SearchError::DuplicateAlias(alias)) if alias == "x"
        ));
        Ok(())
    }

    #[test]
    fn test_to_many_filter_join_makes_entities_distinct() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let filter = FilterMapParser::new(&catalog, "Author")
            .parse(&json!({"books": {"title": {"contains": "a"}}}))?;
        let mut request = SearchRequest::new();
        request.filter_groups.extend(filter);

        let built = build(&catalog, "Author", &request)?;
        let books = built.plan.join("books").cloned();
        assert_eq!(
            books.map(|j| (j.left_key, j.right_key, j.to_many)),
            Some(("id".to_string(), "author_id".to_string(), true))
        );
        assert!(built.plan.distinct);
        Ok(())
    }

    #[test]
    fn test_overridden_back_reference() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let built = build(
            &catalog,
            "Owner",
            &SearchRequest::new().select(Selection::new("pets.name")),
        )?;
        let pets = built.plan.join("pets").cloned();
        assert_eq!(pets.map(|j| j.right_key), Some("owner_id".to_string()));
        Ok(())
    }

    #[test]
    fn test_aggregate_projection() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let request = SearchRequest::new()
            .select(Selection::new("category").with_alias("genre").ordered(1, SortOrder::Asc))
            .select(Selection::new("title"))
            .aggregates(Aggregates {
                sum: vec!["price".to_string()],
                count: vec!["id".to_string()],
                group_by: Some(vec!["category".to_string()]),
                ..Default::default()
            });
        let built = build(&catalog, "Book", &request)?;

        assert_eq!(built.plan.group_by, vec!["category"]);
        let aliases: Vec<&str> = built.plan.projection.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["genre", "count(id)", "sum(price)"]);
        assert_eq!(built.plan.order_by.len(), 1);
        Ok(())
    }

    #[test]
    fn test_sum_needs_numeric() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let request = SearchRequest::new().aggregates(Aggregates {
            avg: vec!["title".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            build(&catalog, "Book", &request),
            Err(SearchError::TypeMismatch { .. })
        ));
        Ok(())
    }
}
