//! In-memory backing store.
//!
//! Tables live in a `DashMap` keyed by table name; each table is a schema plus
//! an `Arc` snapshot of its rows so scans never hold a lock. Plans execute as a
//! Volcano pipeline:
//!
//! ```text
//! scan(root) -> hash join* -> filter -> [aggregate] -> projection
//!            -> [distinct] -> [sort] -> [limit]
//! ```

use crate::access::{DataType, ResultRow, Value};
use crate::catalog::{AttributeType, Cardinality, Catalog, FieldPath};
use crate::error::SearchResult;
use crate::executor::{
    column_index, AggregateFunction, AggregateSpec, ColumnInfo, DistinctExecutor, Executor,
    FilterExecutor, GroupByClause, HashAggregateExecutor, HashJoinExecutor, LimitExecutor,
    ProjectionExecutor, Row, SeqScanExecutor, SortCriteria, SortExecutor,
};
use crate::store::{BackingStore, CancellationToken, QueryPlan, StoreError, StoreResult};
use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use parking_lot::RwLock;
use std::sync::Arc;

/// One physical column and the row keys it is filled from
#[derive(Debug, Clone)]
struct StoredColumn {
    info: ColumnInfo,
    /// Attribute name accepted in input rows besides the column name
    attribute: String,
    /// Association columns also accept `{ "<id>": value }`
    target_id: Option<String>,
}

#[derive(Debug)]
struct TableData {
    columns: Vec<StoredColumn>,
    rows: Arc<Vec<Row>>,
}

impl TableData {
    fn schema(&self) -> Vec<ColumnInfo> {
        self.columns.iter().map(|c| c.info.clone()).collect()
    }
}

/// Catalog-shaped tables held in memory
pub struct MemoryStore {
    catalog: Arc<Catalog>,
    /// Entity name -> table name
    entity_tables: DashMap<String, String>,
    tables: DashMap<String, Arc<RwLock<TableData>>>,
}

impl MemoryStore {
    /// Create empty tables for every entity in `catalog`
    pub fn new(catalog: Arc<Catalog>) -> SearchResult<Self> {
        let store = Self {
            catalog,
            entity_tables: DashMap::new(),
            tables: DashMap::new(),
        };

        let names: Vec<String> = store.catalog.entity_names().map(str::to_string).collect();
        for entity in names {
            let meta = store.catalog.get_entity(&entity)?;
            let columns = store.table_columns(&entity)?;
            debug!(
                "Created table '{}' for {} with {} columns",
                meta.table_name(),
                entity,
                columns.len()
            );
            store
                .entity_tables
                .insert(entity.clone(), meta.table_name().to_string());
            store.tables.insert(
                meta.table_name().to_string(),
                Arc::new(RwLock::new(TableData {
                    columns,
                    rows: Arc::new(Vec::new()),
                })),
            );
        }
        Ok(store)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Physical layout of an entity's table.
    ///
    /// Scalars map to their (possibly overridden) column; to-one associations
    /// store the target identifier in their join column; to-many associations
    /// have no column on this side.
    fn table_columns(&self, entity: &str) -> SearchResult<Vec<StoredColumn>> {
        let resolver = self.catalog.resolver();
        let mut columns: Vec<StoredColumn> = Vec::new();

        for attribute in resolver.visible_attributes(entity) {
            let field = resolver.resolve(entity, &FieldPath::single(attribute.name.as_str()))?;
            let column = match (&attribute.attr_type, field.data_type()) {
                (_, Some(data_type)) => StoredColumn {
                    info: ColumnInfo::new(field.column.clone(), data_type),
                    attribute: attribute.name.clone(),
                    target_id: match &attribute.attr_type {
                        AttributeType::Association { target, .. } => {
                            Some(resolver.id_attribute(target)?.name.clone())
                        }
                        _ => None,
                    },
                },
                (
                    AttributeType::Association {
                        target,
                        cardinality: Cardinality::ToOne { join_column },
                    },
                    None,
                ) => StoredColumn {
                    info: ColumnInfo::new(join_column.clone(), resolver.id_type(target)?),
                    attribute: attribute.name.clone(),
                    target_id: Some(resolver.id_attribute(target)?.name.clone()),
                },
                _ => continue,
            };

            if !columns.iter().any(|c| c.info.name == column.info.name) {
                columns.push(column);
            }
        }
        Ok(columns)
    }

    fn table_for_entity(&self, entity: &str) -> StoreResult<Arc<RwLock<TableData>>> {
        let table = self
            .entity_tables
            .get(entity)
            .map(|t| t.value().clone())
            .ok_or_else(|| StoreError::UnknownTable(entity.to_string()))?;
        self.table(&table)
    }

    fn table(&self, table: &str) -> StoreResult<Arc<RwLock<TableData>>> {
        self.tables
            .get(table)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    /// Insert one entity row given as a JSON object keyed by attribute or column name
    pub fn insert(&self, entity: &str, row: &serde_json::Value) -> StoreResult<()> {
        let table = self.table_for_entity(entity)?;
        let mut data = table.write();
        let values = Self::row_from_json(entity, &data.columns, row)?;
        Arc::make_mut(&mut data.rows).push(values);
        Ok(())
    }

    /// Insert every row of a JSON array
    pub fn insert_all(&self, entity: &str, rows: &[serde_json::Value]) -> StoreResult<usize> {
        for row in rows {
            self.insert(entity, row)?;
        }
        trace!("Inserted {} rows into {}", rows.len(), entity);
        Ok(rows.len())
    }

    /// Load a data set shaped `{ "<Entity>": [ {..}, .. ], .. }`
    pub fn load_json(&self, data: &serde_json::Value) -> StoreResult<usize> {
        let Some(object) = data.as_object() else {
            return Err(StoreError::invalid_row(
                "<data>",
                "data set must be an object keyed by entity name",
            ));
        };

        let mut total = 0;
        for (entity, rows) in object {
            let Some(rows) = rows.as_array() else {
                return Err(StoreError::invalid_row(entity, "rows must be an array"));
            };
            total += self.insert_all(entity, rows)?;
        }
        debug!("Loaded {} rows into the memory store", total);
        Ok(total)
    }

    pub fn row_count(&self, entity: &str) -> StoreResult<usize> {
        Ok(self.table_for_entity(entity)?.read().rows.len())
    }

    fn row_from_json(
        entity: &str,
        columns: &[StoredColumn],
        row: &serde_json::Value,
    ) -> StoreResult<Row> {
        let object = row
            .as_object()
            .ok_or_else(|| StoreError::invalid_row(entity, "row must be a JSON object"))?;

        if let Some(unknown) = object
            .keys()
            .find(|k| !columns.iter().any(|c| &c.attribute == *k || &c.info.name == *k))
        {
            return Err(StoreError::invalid_row(
                entity,
                format!("unknown attribute '{}'", unknown),
            ));
        }

        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            let raw = object
                .get(&column.attribute)
                .or_else(|| object.get(&column.info.name));
            let raw = match (raw, &column.target_id) {
                (Some(serde_json::Value::Object(nested)), Some(id)) => nested.get(id),
                (raw, _) => raw,
            };

            let value = match raw {
                None => Value::Null,
                Some(json) => Value::from_json(json, column.info.data_type).ok_or_else(|| {
                    StoreError::invalid_row(
                        entity,
                        format!(
                            "value {} is not a valid {} for '{}'",
                            json, column.info.data_type, column.attribute
                        ),
                    )
                })?,
            };
            values.push(value);
        }
        Ok(values)
    }

    fn scan(
        &self,
        table: &str,
        prefix: Option<&str>,
        cancel: &CancellationToken,
    ) -> StoreResult<Box<dyn Executor>> {
        let table_data = self.table(table)?;
        let data = table_data.read();
        let scan = SeqScanExecutor::new(table, data.schema(), Arc::clone(&data.rows), cancel.clone());
        Ok(match prefix {
            Some(prefix) => Box::new(scan.with_prefix(prefix)),
            None => Box::new(scan),
        })
    }

    /// Scan, join and filter: the row source shared by fetch and count
    fn source(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<Box<dyn Executor>> {
        let mut executor = self.scan(&plan.root_table, None, cancel)?;

        for join in &plan.joins {
            let right = self.scan(&join.table, Some(&join.path), cancel)?;
            let right_key = format!("{}.{}", join.path, join.right_key);
            executor = Box::new(
                HashJoinExecutor::new(executor, right, &join.left_key, &right_key)
                    .map_err(StoreError::from_execution)?,
            );
        }

        let filter =
            FilterExecutor::new(executor, &plan.predicate).map_err(StoreError::from_execution)?;
        Ok(Box::new(filter))
    }

    fn build_fetch(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<Box<dyn Executor>> {
        let source = self.source(plan, cancel)?;
        Self::shape(source, plan).map_err(StoreError::from_execution)
    }

    /// Aggregate, project, de-duplicate, order and page the filtered rows
    fn shape(mut executor: Box<dyn Executor>, plan: &QueryPlan) -> Result<Box<dyn Executor>> {
        if plan.is_aggregate() {
            let schema = executor.output_schema();
            let group_by = plan
                .group_by
                .iter()
                .map(|c| column_index(schema, c))
                .collect::<Result<Vec<_>>>()?;
            let aggregates = plan
                .aggregates
                .iter()
                .map(|a| {
                    Ok(AggregateSpec::with_alias(
                        a.function,
                        Some(column_index(schema, &a.column)?),
                        a.alias.clone(),
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            executor = Box::new(HashAggregateExecutor::new(
                executor,
                GroupByClause::new(group_by),
                aggregates,
            )?);
        }

        let schema = executor.output_schema();
        let columns: Vec<(usize, String)> = if plan.projection.is_empty() {
            schema
                .iter()
                .enumerate()
                .map(|(i, c)| (i, c.name.clone()))
                .collect()
        } else {
            plan.projection
                .iter()
                .map(|p| Ok((column_index(schema, &p.column)?, p.alias.clone())))
                .collect::<Result<Vec<_>>>()?
        };
        executor = Box::new(ProjectionExecutor::with_aliases(executor, columns)?);

        if plan.distinct {
            executor = Box::new(DistinctExecutor::new(executor));
        }

        if !plan.order_by.is_empty() {
            let schema = executor.output_schema();
            let criteria = plan
                .order_by
                .iter()
                .map(|o| Ok(SortCriteria::new(column_index(schema, &o.alias)?, o.direction)))
                .collect::<Result<Vec<_>>>()?;
            executor = Box::new(SortExecutor::new(executor, criteria)?);
        }

        if let Some(page) = plan.page {
            executor = Box::new(LimitExecutor::with_offset(
                executor,
                Some(page.limit),
                page.offset,
            ));
        }
        Ok(executor)
    }

    /// Count rows, or distinct root identifiers when joins can repeat a root
    fn count_roots(mut executor: Box<dyn Executor>, plan: &QueryPlan) -> Result<u64> {
        if plan.distinct || plan.has_to_many_join() {
            let id = column_index(executor.output_schema(), &plan.root_id_column)?;
            executor = Box::new(DistinctExecutor::on_columns(executor, vec![id])?);
        }
        let mut counter = HashAggregateExecutor::new(
            executor,
            GroupByClause::default(),
            vec![AggregateSpec::new(AggregateFunction::Count, None)],
        )?;
        match Self::drain(&mut counter)?.first().and_then(|r| r.first()) {
            Some(Value::Int64(n)) => Ok(u64::try_from(*n)?),
            other => anyhow::bail!("Unexpected count result: {:?}", other),
        }
    }

    /// Type of a physical column in an entity's table
    pub fn column_type(&self, entity: &str, column: &str) -> StoreResult<Option<DataType>> {
        let table = self.table_for_entity(entity)?;
        let data = table.read();
        Ok(data
            .columns
            .iter()
            .find(|c| c.info.name == column)
            .map(|c| c.info.data_type))
    }

    fn drain(executor: &mut dyn Executor) -> Result<Vec<Row>> {
        executor.init()?;
        let mut rows = Vec::new();
        while let Some(row) = executor.next()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl BackingStore for MemoryStore {
    fn fetch(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<Vec<ResultRow>> {
        cancel.check()?;
        debug!("Executing plan: {}", plan);

        let mut executor = self.build_fetch(plan, cancel)?;
        let aliases: Vec<String> = executor
            .output_schema()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let rows = Self::drain(executor.as_mut()).map_err(StoreError::from_execution)?;

        trace!("Plan produced {} rows", rows.len());
        Ok(rows
            .into_iter()
            .map(|values| ResultRow::from_parts(&aliases, values))
            .collect())
    }

    fn count(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<u64> {
        cancel.check()?;
        debug!("Counting plan: {}", plan);

        let executor = self.source(plan, cancel)?;
        Self::count_roots(executor, plan).map_err(StoreError::from_execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;
    use crate::executor::SortOrder;
    use crate::expression::Expression;
    use crate::store::{AggregateItem, JoinSpec, OrderItem, PageWindow, ProjectionItem};
    use serde_json::json;

    fn store() -> Result<MemoryStore> {
        let store = MemoryStore::new(Arc::new(library_catalog()?))?;
        store.load_json(&json!({
            "Author": [
                {"id": 10, "name": "Frank Herbert", "born": "1920-10-08"},
                {"id": 20, "name": "Jane Austen", "born": "1775-12-16"},
            ],
            "Book": [
                {"id": 1, "title": "Dune", "price": 9.5, "category": "scifi", "author": 10},
                {"id": 2, "title": "Emma", "price": 4.0, "category": "classic", "author": {"id": 20}},
                {"id": 3, "title": "Persuasion", "price": 5.0, "category": "classic", "author_id": 20},
                {"id": 4, "title": "Anonymous", "category": "classic"},
            ],
        }))?;
        Ok(store)
    }

    fn book_plan() -> QueryPlan {
        let mut plan = QueryPlan::new("Book", "books", "id");
        plan.projection = vec![
            ProjectionItem::new("id", "book.id"),
            ProjectionItem::new("title", "book.title"),
        ];
        plan
    }

    fn author_join() -> JoinSpec {
        JoinSpec {
            path: "author".to_string(),
            entity: "Author".to_string(),
            table: "authors".to_string(),
            left_key: "author_id".to_string(),
            right_key: "id".to_string(),
            to_many: false,
        }
    }

    #[test]
    fn test_table_layout_follows_catalog() -> Result<()> {
        let store = store()?;
        assert_eq!(store.column_type("Book", "author_id")?, Some(DataType::Int64));
        assert_eq!(store.column_type("Book", "author")?, None);
        assert_eq!(store.column_type("Pet", "owner_id")?, Some(DataType::Uuid));
        assert_eq!(store.column_type("Author", "books")?, None);
        assert_eq!(store.row_count("Book")?, 4);
        Ok(())
    }

    #[test]
    fn test_invalid_rows_rejected() -> Result<()> {
        let store = store()?;
        assert!(matches!(
            store.insert("Book", &json!({"id": 9, "colour": "red"})),
            Err(StoreError::InvalidRow { .. })
        ));
        assert!(matches!(
            store.insert("Book", &json!({"id": "nine"})),
            Err(StoreError::InvalidRow { .. })
        ));
        assert!(matches!(
            store.insert("Shelf", &json!({})),
            Err(StoreError::UnknownTable(_))
        ));
        Ok(())
    }

    #[test]
    fn test_fetch_with_join_filter_and_order() -> Result<()> {
        let store = store()?;
        let mut plan = book_plan();
        plan.joins.push(author_join());
        plan.projection
            .push(ProjectionItem::new("author.name", "book.author.name"));
        plan.predicate = Expression::eq(
            Expression::column("author.name"),
            Expression::literal(Value::String("Jane Austen".into())),
        );
        plan.order_by.push(OrderItem {
            alias: "book.title".to_string(),
            direction: SortOrder::Desc,
        });

        let rows = store.fetch(&plan, &CancellationToken::new())?;
        let titles: Vec<&Value> = rows.iter().filter_map(|r| r.get("book.title")).collect();
        assert_eq!(
            titles,
            vec![
                &Value::String("Persuasion".into()),
                &Value::String("Emma".into())
            ]
        );
        assert_eq!(
            rows[0].get("book.author.name"),
            Some(&Value::String("Jane Austen".into()))
        );
        Ok(())
    }

    #[test]
    fn test_fetch_page_window() -> Result<()> {
        let store = store()?;
        let mut plan = book_plan();
        plan.page = Some(PageWindow { offset: 1, limit: 2 });

        let rows = store.fetch(&plan, &CancellationToken::new())?;
        let ids: Vec<&Value> = rows.iter().filter_map(|r| r.get("book.id")).collect();
        assert_eq!(ids, vec![&Value::Int64(2), &Value::Int64(3)]);
        Ok(())
    }

    #[test]
    fn test_grouped_aggregate() -> Result<()> {
        let store = store()?;
        let mut plan = QueryPlan::new("Book", "books", "id");
        plan.group_by = vec!["category".to_string()];
        plan.aggregates = vec![AggregateItem {
            function: AggregateFunction::Sum,
            column: "price".to_string(),
            alias: "sum(price)".to_string(),
        }];
        plan.projection = vec![
            ProjectionItem::new("category", "category"),
            ProjectionItem::new("sum(price)", "sum(price)"),
        ];

        let rows = store.fetch(&plan, &CancellationToken::new())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("category"), Some(&Value::String("classic".into())));
        assert_eq!(rows[1].get("sum(price)"), Some(&Value::Float64(9.0)));
        Ok(())
    }

    #[test]
    fn test_count_distinct_roots_over_to_many_join() -> Result<()> {
        let store = store()?;
        let mut plan = QueryPlan::new("Author", "authors", "id");
        plan.joins.push(JoinSpec {
            path: "books".to_string(),
            entity: "Book".to_string(),
            table: "books".to_string(),
            left_key: "id".to_string(),
            right_key: "author_id".to_string(),
            to_many: true,
        });
        plan.predicate = Expression::eq(
            Expression::column("books.category"),
            Expression::literal(Value::String("classic".into())),
        );

        let cancel = CancellationToken::new();
        assert_eq!(store.count(&plan, &cancel)?, 1);

        plan.predicate = Expression::match_all();
        assert_eq!(store.count(&plan, &cancel)?, 2);
        Ok(())
    }

    #[test]
    fn test_cancelled_fetch() -> Result<()> {
        let store = store()?;
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            store.fetch(&book_plan(), &cancel),
            Err(StoreError::Cancelled)
        ));
        assert!(matches!(
            store.count(&book_plan(), &cancel),
            Err(StoreError::Cancelled)
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_plan_column() -> Result<()> {
        let store = store()?;
        let mut plan = book_plan();
        plan.projection.push(ProjectionItem::new("isbn13", "book.isbn13"));
        assert!(matches!(
            store.fetch(&plan, &CancellationToken::new()),
            Err(StoreError::Execution(_))
        ));
        Ok(())
    }
}
