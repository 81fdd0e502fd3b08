//! Search request model: the untyped wire form and the typed, resolved form.

use crate::executor::SortOrder;
use crate::filter::{FilterNode, RawFilterParameter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter groups as sent by callers: one filter object or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFilters {
    Many(Vec<serde_json::Value>),
    One(serde_json::Value),
}

impl Default for RawFilters {
    fn default() -> Self {
        RawFilters::Many(Vec::new())
    }
}

impl RawFilters {
    pub fn groups(&self) -> Vec<&serde_json::Value> {
        match self {
            RawFilters::Many(groups) => groups.iter().collect(),
            RawFilters::One(serde_json::Value::Null) => Vec::new(),
            RawFilters::One(group) => vec![group],
        }
    }
}

/// A requested field: a bare path or a path with alias and ordering
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        priority: Option<i32>,
        #[serde(default)]
        direction: Option<SortOrder>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub number: usize,
    #[serde(default)]
    pub size: Option<usize>,
}

/// Aggregate and group-by path lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Aggregates {
    pub count: Vec<String>,
    pub sum: Vec<String>,
    pub avg: Vec<String>,
    pub min: Vec<String>,
    pub max: Vec<String>,
    pub group_by: Option<Vec<String>>,
}

impl Aggregates {
    /// True when any aggregate function was requested
    pub fn has_functions(&self) -> bool {
        !(self.count.is_empty()
            && self.sum.is_empty()
            && self.avg.is_empty()
            && self.min.is_empty()
            && self.max.is_empty())
    }

    pub fn contains(&self, path: &str) -> bool {
        [&self.count, &self.sum, &self.avg, &self.min, &self.max]
            .iter()
            .any(|list| list.iter().any(|p| p == path))
    }
}

/// Search request as received on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSearchRequest {
    pub filters: RawFilters,
    pub fields: Vec<RawField>,
    pub page: Option<PageRequest>,
    pub aggregates: Option<Aggregates>,
    pub parameters: BTreeMap<String, RawFilterParameter>,
}

impl RawSearchRequest {
    pub fn from_json(json: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(json)
    }
}

/// One projected field
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: String,
    /// Result key; the formatted path when absent
    pub alias: Option<String>,
    /// Sort precedence; unprioritised selections do not order results
    pub priority: Option<i32>,
    pub direction: SortOrder,
}

impl Selection {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            priority: None,
            direction: SortOrder::Asc,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn ordered(mut self, priority: i32, direction: SortOrder) -> Self {
        self.priority = Some(priority);
        self.direction = direction;
        self
    }
}

/// A parsed search request, resolved against one root entity
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// OR-combined; no groups matches everything
    pub filter_groups: Vec<FilterNode>,
    /// AND-ed with the filter groups
    pub parameters: Option<FilterNode>,
    pub selections: Vec<Selection>,
    pub page: Option<PageRequest>,
    pub aggregates: Option<Aggregates>,
    /// A pagination-metadata field was requested
    pub page_metadata: bool,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, group: FilterNode) -> Self {
        self.filter_groups.push(group);
        self
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }

    pub fn page(mut self, number: usize, size: usize) -> Self {
        self.page = Some(PageRequest {
            number,
            size: Some(size),
        });
        self
    }

    pub fn aggregates(mut self, aggregates: Aggregates) -> Self {
        self.aggregates = Some(aggregates);
        self
    }
}
