//! Parameter filters: flat `path -> {operator, values}` constraints.
//!
//! They are rewritten into the filter-map shape and parsed like any other
//! filter, so they get the same resolution and type checks.

use crate::access::TypeCategory;
use crate::catalog::{EntityMetadataProvider, FieldPath, FieldPathResolver};
use crate::error::{SearchError, SearchResult};
use crate::filter::node::FilterNode;
use crate::filter::parser::FilterMapParser;
use serde::Deserialize;
use serde_json::{json, Value as Json};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
}

impl FromStr for ParameterOperator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "equals" | "eq" => Ok(ParameterOperator::Equals),
            "notequals" | "ne" => Ok(ParameterOperator::NotEquals),
            "in" => Ok(ParameterOperator::In),
            "notin" => Ok(ParameterOperator::NotIn),
            _ => Err(SearchError::UnknownOperator(s.to_string())),
        }
    }
}

/// Wire form of a parameter filter
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilterParameter {
    pub operator: String,
    #[serde(default)]
    pub values: Vec<Json>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterParameter {
    pub path: String,
    pub operator: ParameterOperator,
    pub values: Vec<Json>,
}

impl FilterParameter {
    pub fn new(path: impl Into<String>, operator: ParameterOperator, values: Vec<Json>) -> Self {
        Self {
            path: path.into(),
            operator,
            values,
        }
    }

    pub fn from_raw(path: impl Into<String>, raw: RawFilterParameter) -> SearchResult<Self> {
        Ok(Self::new(path, raw.operator.parse()?, raw.values))
    }

    /// Filter-map form of this parameter
    fn to_filter_map<P>(&self, resolver: &FieldPathResolver<'_, P>, root: &str) -> SearchResult<Json>
    where
        P: EntityMetadataProvider + ?Sized,
    {
        let path = FieldPath::parse(&self.path).ok_or_else(|| {
            SearchError::UnresolvableFieldPath {
                entity: root.to_string(),
                path: self.path.clone(),
            }
        })?;
        let field = resolver.resolve(root, &path)?;
        let data_type = field.data_type().ok_or_else(|| {
            SearchError::type_mismatch(&self.path, "parameter filters need a scalar field")
        })?;

        let equality = if data_type.category() == TypeCategory::Textual {
            "equals"
        } else {
            "eq"
        };

        let single = || match self.values.as_slice() {
            [value] => Ok(value.clone()),
            _ => Err(SearchError::malformed(
                &self.path,
                format!("expected exactly one value, got {}", self.values.len()),
            )),
        };

        let (negated, op, literal) = match self.operator {
            ParameterOperator::Equals => (false, equality, single()?),
            ParameterOperator::NotEquals => (true, equality, single()?),
            ParameterOperator::In => (false, "in", Json::Array(self.values.clone())),
            ParameterOperator::NotIn => (true, "in", Json::Array(self.values.clone())),
        };

        let mut leaf = json!({ op: literal });
        for segment in path.segments().iter().rev() {
            leaf = json!({ segment.as_str(): leaf });
        }
        Ok(if negated { json!({ "not": [leaf] }) } else { leaf })
    }
}

/// AND all parameters into one filter tree; `None` when there are none
pub fn parameters_to_filter<P>(
    provider: &P,
    root: &str,
    parameters: &[FilterParameter],
) -> SearchResult<Option<FilterNode>>
where
    P: EntityMetadataProvider + ?Sized,
{
    if parameters.is_empty() {
        return Ok(None);
    }
    let resolver = FieldPathResolver::new(provider);
    let clauses = parameters
        .iter()
        .map(|p| p.to_filter_map(&resolver, root))
        .collect::<SearchResult<Vec<_>>>()?;

    FilterMapParser::new(provider, root).parse(&json!({ "and": clauses }))
}
