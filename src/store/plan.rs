//! Store-neutral description of a compiled search.
//!
//! Column names follow one convention throughout: root columns are bare
//! physical names (`title`), columns of a joined entity are prefixed with the
//! dotted association path it was joined under (`author.publisher.name`).

use crate::executor::{AggregateFunction, SortOrder};
use crate::expression::Expression;
use std::fmt;

/// A left outer join attaching one association to the row
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    /// Dotted association path; prefixes the joined columns
    pub path: String,
    pub entity: String,
    pub table: String,
    /// Column of the already joined row, qualified
    pub left_key: String,
    /// Column of the joined table, unqualified
    pub right_key: String,
    /// The join may produce several rows per root row
    pub to_many: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub column: String,
    pub alias: String,
}

impl ProjectionItem {
    pub fn new(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: alias.into(),
        }
    }
}

/// One aggregate output column
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateItem {
    pub function: AggregateFunction,
    pub column: String,
    pub alias: String,
}

/// Ordering on a projected alias
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub alias: String,
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

/// Everything a backing store needs to answer a search
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub root_entity: String,
    pub root_table: String,
    /// Identifier column of the root table, used for distinct counting
    pub root_id_column: String,
    /// Joins in dependency order; a join's `left_key` only names earlier columns
    pub joins: Vec<JoinSpec>,
    pub predicate: Expression,
    pub distinct: bool,
    /// Output columns; with aggregation these name group-by columns or aggregate aliases
    pub projection: Vec<ProjectionItem>,
    pub group_by: Vec<String>,
    pub aggregates: Vec<AggregateItem>,
    pub order_by: Vec<OrderItem>,
    pub page: Option<PageWindow>,
}

impl QueryPlan {
    /// A plan selecting every row of `root_table`, with nothing projected yet
    pub fn new(
        root_entity: impl Into<String>,
        root_table: impl Into<String>,
        root_id_column: impl Into<String>,
    ) -> Self {
        Self {
            root_entity: root_entity.into(),
            root_table: root_table.into(),
            root_id_column: root_id_column.into(),
            joins: Vec::new(),
            predicate: Expression::match_all(),
            distinct: false,
            projection: Vec::new(),
            group_by: Vec::new(),
            aggregates: Vec::new(),
            order_by: Vec::new(),
            page: None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !self.aggregates.is_empty() || !self.group_by.is_empty()
    }

    pub fn has_to_many_join(&self) -> bool {
        self.joins.iter().any(|j| j.to_many)
    }

    pub fn join(&self, path: &str) -> Option<&JoinSpec> {
        self.joins.iter().find(|j| j.path == path)
    }

    /// Same plan bounded to at most `limit` rows from the first one
    pub fn limited(&self, limit: usize) -> Self {
        let mut plan = self.clone();
        plan.page = Some(PageWindow { offset: 0, limit });
        plan
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FROM {}", self.root_table)?;
        for join in &self.joins {
            write!(
                f,
                " LEFT JOIN {} AS {} ON {} = {}.{}",
                join.table, join.path, join.left_key, join.path, join.right_key
            )?;
        }
        write!(f, " WHERE {}", self.predicate)?;
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.join(", "))?;
        }
        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|o| format!("{} {:?}", o.alias, o.direction))
                .collect();
            write!(f, " ORDER BY {}", order.join(", "))?;
        }
        if let Some(page) = self.page {
            write!(f, " LIMIT {} OFFSET {}", page.limit, page.offset)?;
        }
        Ok(())
    }
}
