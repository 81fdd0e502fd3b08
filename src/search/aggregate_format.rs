//! Normalises the aggregate section of a request.

use crate::error::{SearchError, SearchResult};
use crate::search::path_format::PathFormatter;
use crate::search::request::Aggregates;
use log::debug;

pub struct AggregateFormatter<'a> {
    formatter: &'a PathFormatter,
}

impl<'a> AggregateFormatter<'a> {
    pub fn new(formatter: &'a PathFormatter) -> Self {
        Self { formatter }
    }

    /// Format every aggregate path and settle the grouping.
    ///
    /// `None` when nothing is requested. Without an explicit `groupBy`, the
    /// selected paths not aggregated themselves become the grouping.
    pub fn format(
        &self,
        aggregates: Option<&Aggregates>,
        selected: &[String],
    ) -> SearchResult<Option<Aggregates>> {
        let Some(aggregates) = aggregates else {
            return Ok(None);
        };

        let format_all =
            |paths: &[String]| -> Vec<String> { paths.iter().map(|p| self.formatter.format(p)).collect() };
        let mut formatted = Aggregates {
            count: format_all(&aggregates.count),
            sum: format_all(&aggregates.sum),
            avg: format_all(&aggregates.avg),
            min: format_all(&aggregates.min),
            max: format_all(&aggregates.max),
            group_by: aggregates
                .group_by
                .as_deref()
                .map(format_all)
                .filter(|g| !g.is_empty()),
        };

        if !formatted.has_functions() && formatted.group_by.is_none() {
            return Ok(None);
        }

        match &formatted.group_by {
            Some(group_by) => {
                if let Some(conflict) = group_by.iter().find(|p| formatted.contains(p)) {
                    return Err(SearchError::AggregateFieldConflict {
                        path: conflict.clone(),
                    });
                }
            }
            None => {
                let derived: Vec<String> = selected
                    .iter()
                    .filter(|p| !formatted.contains(p))
                    .cloned()
                    .collect();
                if !derived.is_empty() {
                    debug!("derived groupBy {:?}", derived);
                    formatted.group_by = Some(derived);
                }
            }
        }
        Ok(Some(formatted))
    }
}
