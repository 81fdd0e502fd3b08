//! Grouped aggregation for aggregate searches.
//!
//! Rows are bucketed by their group-by values (NULL is a valid key) and
//! COUNT, SUM, AVG, MIN and MAX fold over each bucket, skipping NULL inputs.
//! Groups come out in first-seen order.

use crate::access::{DataType, TypeCategory, Value};
use crate::executor::{ColumnInfo, Executor, HashKey, Row};
use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Counts non-NULL values, or rows for COUNT(*)
    Count,
    /// Sums numeric values, ignoring NULLs
    Sum,
    /// Average of numeric values, ignoring NULLs
    Avg,
    /// Minimum value, ignoring NULLs
    Min,
    /// Maximum value, ignoring NULLs
    Max,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Count,
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Min,
        AggregateFunction::Max,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Whether the function only accepts numeric input
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregateFunction::Sum | AggregateFunction::Avg)
    }

    /// Returns the output data type for this aggregate function given the input type
    pub fn output_type(&self, input_type: Option<DataType>) -> DataType {
        match self {
            AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Sum => match input_type {
                Some(DataType::Float64) => DataType::Float64,
                _ => DataType::Int64,
            },
            AggregateFunction::Avg => DataType::Float64,
            AggregateFunction::Min | AggregateFunction::Max => {
                input_type.unwrap_or(DataType::Int64)
            }
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Specification for an aggregate computation
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    /// The aggregate function to apply
    pub function: AggregateFunction,
    /// Column index to aggregate (None for COUNT(*))
    pub column_idx: Option<usize>,
    /// Optional alias for the result column
    pub alias: Option<String>,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, column_idx: Option<usize>) -> Self {
        Self {
            function,
            column_idx,
            alias: None,
        }
    }

    pub fn with_alias(
        function: AggregateFunction,
        column_idx: Option<usize>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            function,
            column_idx,
            alias: Some(alias.into()),
        }
    }
}

/// GROUP BY column positions
#[derive(Debug, Clone, Default)]
pub struct GroupByClause {
    pub column_indices: Vec<usize>,
}

impl GroupByClause {
    pub fn new(column_indices: Vec<usize>) -> Self {
        Self { column_indices }
    }

    /// Check if this is an empty GROUP BY (aggregate without grouping)
    pub fn is_empty(&self) -> bool {
        self.column_indices.is_empty()
    }
}

/// Running state of one aggregate within one group
#[derive(Debug, Clone, Default)]
struct AggregateState {
    count: i64,
    int_sum: i64,
    float_sum: f64,
    saw_float: bool,
    extreme: Option<Value>,
}

impl AggregateState {
    fn update(&mut self, value: &Value, function: AggregateFunction) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }

        match function {
            AggregateFunction::Count => {}
            AggregateFunction::Sum | AggregateFunction::Avg => match value {
                Value::Int32(n) => self.add_int(i64::from(*n))?,
                Value::Int64(n) => self.add_int(*n)?,
                Value::Float64(f) => {
                    self.saw_float = true;
                    self.float_sum += f;
                }
                other => bail!("Cannot {} non-numeric value {}", function, other),
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                let wanted = if function == AggregateFunction::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = match &self.extreme {
                    None => true,
                    Some(current) => value.compare(current) == Some(wanted),
                };
                if replace {
                    self.extreme = Some(value.clone());
                }
            }
        }
        self.count += 1;
        Ok(())
    }

    fn add_int(&mut self, n: i64) -> Result<()> {
        self.int_sum = match self.int_sum.checked_add(n) {
            Some(sum) => sum,
            None => bail!("Integer overflow while summing"),
        };
        Ok(())
    }

    fn finalize(&self, function: AggregateFunction, output_type: DataType) -> Value {
        match function {
            AggregateFunction::Count => Value::Int64(self.count),
            _ if self.count == 0 => Value::Null,
            AggregateFunction::Sum => match output_type {
                DataType::Float64 => Value::Float64(self.int_sum as f64 + self.float_sum),
                _ => Value::Int64(self.int_sum),
            },
            AggregateFunction::Avg => {
                let total = self.int_sum as f64 + self.float_sum;
                Value::Float64(total / self.count as f64)
            }
            AggregateFunction::Min | AggregateFunction::Max => {
                self.extreme.clone().unwrap_or(Value::Null)
            }
        }
    }
}

/// Hash-based aggregation executor
pub struct HashAggregateExecutor {
    child: Box<dyn Executor>,
    group_by: GroupByClause,
    aggregates: Vec<AggregateSpec>,
    output_schema: Vec<ColumnInfo>,
    /// Group key -> position in `groups`
    group_index: HashMap<HashKey, usize>,
    groups: Vec<(Row, Vec<AggregateState>)>,
    position: usize,
    consumed_input: bool,
    initialized: bool,
}

impl HashAggregateExecutor {
    /// Create a new hash aggregate executor
    pub fn new(
        child: Box<dyn Executor>,
        group_by: GroupByClause,
        aggregates: Vec<AggregateSpec>,
    ) -> Result<Self> {
        if aggregates.is_empty() && group_by.is_empty() {
            bail!("At least one aggregate function or grouping column must be specified");
        }

        let child_schema = child.output_schema();
        let mut output_schema = Vec::new();

        for &idx in &group_by.column_indices {
            match child_schema.get(idx) {
                Some(column) => output_schema.push(column.clone()),
                None => bail!("GROUP BY column index {} is out of bounds", idx),
            }
        }

        for agg in &aggregates {
            let input = match agg.column_idx {
                Some(idx) => match child_schema.get(idx) {
                    Some(column) => Some(column),
                    None => bail!("Aggregate column index {} is out of bounds", idx),
                },
                None => None,
            };

            if agg.function.requires_numeric() {
                match input {
                    Some(column) if column.data_type.category() == TypeCategory::Numeric => {}
                    Some(column) => bail!(
                        "{} requires a numeric column, '{}' is {}",
                        agg.function,
                        column.name,
                        column.data_type
                    ),
                    None => bail!("{}(*) is not supported", agg.function),
                }
            }

            let name = match (&agg.alias, input) {
                (Some(alias), _) => alias.clone(),
                (None, Some(column)) => format!("{}({})", agg.function, column.name),
                (None, None) => format!("{}(*)", agg.function),
            };
            let input_type = input.map(|c| c.data_type);
            output_schema.push(ColumnInfo::new(name, agg.function.output_type(input_type)));
        }

        Ok(Self {
            child,
            group_by,
            aggregates,
            output_schema,
            group_index: HashMap::new(),
            groups: Vec::new(),
            position: 0,
            consumed_input: false,
            initialized: false,
        })
    }

    /// Process all input rows and build groups
    fn consume_input(&mut self) -> Result<()> {
        while let Some(row) = self.child.next()? {
            let key: Row = self
                .group_by
                .column_indices
                .iter()
                .map(|&idx| row[idx].clone())
                .collect();

            let slot = match self.group_index.get(&HashKey(key.clone())) {
                Some(&slot) => slot,
                None => {
                    self.groups.push((
                        key.clone(),
                        vec![AggregateState::default(); self.aggregates.len()],
                    ));
                    self.group_index.insert(HashKey(key), self.groups.len() - 1);
                    self.groups.len() - 1
                }
            };

            let states = &mut self.groups[slot].1;
            for (state, agg) in states.iter_mut().zip(&self.aggregates) {
                match agg.column_idx {
                    Some(idx) => state.update(&row[idx], agg.function)?,
                    // COUNT(*) counts every row
                    None => state.update(&Value::Boolean(true), agg.function)?,
                }
            }
        }

        // Without GROUP BY an empty input still yields one row
        if self.groups.is_empty() && self.group_by.is_empty() {
            self.groups.push((
                Vec::new(),
                vec![AggregateState::default(); self.aggregates.len()],
            ));
        }

        log::trace!("Aggregated input into {} groups", self.groups.len());
        self.consumed_input = true;
        Ok(())
    }
}

impl Executor for HashAggregateExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.group_index.clear();
        self.groups.clear();
        self.position = 0;
        self.consumed_input = false;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        if !self.consumed_input {
            self.consume_input()?;
        }

        let Some((key, states)) = self.groups.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;

        let offset = key.len();
        let mut values = key.clone();
        for (i, (state, agg)) in states.iter().zip(&self.aggregates).enumerate() {
            let output_type = self.output_schema[offset + i].data_type;
            values.push(state.finalize(agg.function, output_type));
        }
        Ok(Some(values))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
