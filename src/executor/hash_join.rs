//! Left outer equi-join attaching associated entities to their owners.
//!
//! The right side is hashed on its key column during `init()`. Each left row
//! is then emitted once per match, or once padded with NULLs when nothing
//! matches, so owners without an association survive the join.

use crate::access::Value;
use crate::executor::{column_index, ColumnInfo, Executor, HashKey, Row};
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Left outer hash join on a single key column per side
pub struct HashJoinExecutor {
    /// Left child executor
    left_child: Box<dyn Executor>,
    /// Right child executor
    right_child: Box<dyn Executor>,
    /// Key column position in left rows
    left_key: usize,
    /// Key column position in right rows
    right_key: usize,
    /// Output schema (left schema + right schema)
    output_schema: Vec<ColumnInfo>,
    /// Width of right rows, for NULL padding
    right_width: usize,
    /// Hash table mapping join key values to right rows
    hash_table: HashMap<HashKey, Vec<Row>>,
    /// Current left row being processed
    current_left: Option<Row>,
    /// Matches for the current left row
    current_matches: Vec<Row>,
    /// Index of the next match to return
    current_match_index: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl HashJoinExecutor {
    /// Create a new left outer hash join
    ///
    /// # Arguments
    /// * `left_child` - Owner side; every row survives the join
    /// * `right_child` - Associated side
    /// * `left_key` - Column name in the left schema
    /// * `right_key` - Column name in the right schema
    pub fn new(
        left_child: Box<dyn Executor>,
        right_child: Box<dyn Executor>,
        left_key: &str,
        right_key: &str,
    ) -> Result<Self> {
        let left_schema = left_child.output_schema();
        let right_schema = right_child.output_schema();
        let left_idx = column_index(left_schema, left_key)?;
        let right_idx = column_index(right_schema, right_key)?;

        let left_type = left_schema[left_idx].data_type;
        let right_type = right_schema[right_idx].data_type;
        if left_type != right_type {
            bail!(
                "Join key type mismatch: {} is {} but {} is {}",
                left_key,
                left_type,
                right_key,
                right_type
            );
        }

        let output_schema: Vec<ColumnInfo> = left_schema
            .iter()
            .cloned()
            .chain(right_schema.iter().cloned())
            .collect();
        let right_width = right_schema.len();

        Ok(Self {
            left_child,
            right_child,
            left_key: left_idx,
            right_key: right_idx,
            output_schema,
            right_width,
            hash_table: HashMap::new(),
            current_left: None,
            current_matches: Vec::new(),
            current_match_index: 0,
            initialized: false,
        })
    }

    /// Build the hash table from the right relation
    fn build_hash_table(&mut self) -> Result<()> {
        self.hash_table.clear();

        while let Some(right_row) = self.right_child.next()? {
            let key = HashKey(vec![right_row[self.right_key].clone()]);
            // NULL keys never match
            if key.has_null() {
                continue;
            }
            self.hash_table.entry(key).or_default().push(right_row);
        }

        Ok(())
    }

    fn probe(&mut self, left_row: Row) {
        let key = HashKey(vec![left_row[self.left_key].clone()]);
        self.current_matches = match self.hash_table.get(&key) {
            Some(matches) if !key.has_null() => matches.clone(),
            _ => vec![vec![Value::Null; self.right_width]],
        };
        self.current_left = Some(left_row);
        self.current_match_index = 0;
    }
}

impl Executor for HashJoinExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.left_child.init()?;
        self.right_child.init()?;
        self.build_hash_table()?;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        loop {
            if let Some(left_row) = &self.current_left {
                if let Some(right_row) = self.current_matches.get(self.current_match_index) {
                    self.current_match_index += 1;

                    let mut combined = left_row.clone();
                    combined.extend(right_row.iter().cloned());
                    return Ok(Some(combined));
                }
            }

            match self.left_child.next()? {
                Some(left_row) => self.probe(left_row),
                None => return Ok(None),
            }
        }
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DataType;
    use crate::executor::test_util::{collect, MockExecutor};

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    fn books() -> MockExecutor {
        MockExecutor::new(
            vec![
                vec![Value::Int64(1), s("Dune"), Value::Int64(10)],
                vec![Value::Int64(2), s("Emma"), Value::Int64(20)],
                vec![Value::Int64(3), s("Anonymous"), Value::Null],
                vec![Value::Int64(4), s("Persuasion"), Value::Int64(20)],
            ],
            vec![
                ColumnInfo::new("id", DataType::Int64),
                ColumnInfo::new("title", DataType::Varchar),
                ColumnInfo::new("author_id", DataType::Int64),
            ],
        )
    }

    fn authors() -> MockExecutor {
        MockExecutor::new(
            vec![
                vec![Value::Int64(10), s("Herbert")],
                vec![Value::Int64(20), s("Austen")],
                vec![Value::Int64(30), s("Gibson")],
            ],
            vec![
                ColumnInfo::new("author.id", DataType::Int64),
                ColumnInfo::new("author.name", DataType::Varchar),
            ],
        )
    }

    #[test]
    fn test_to_one_join_keeps_unmatched_left_rows() -> Result<()> {
        let mut join = HashJoinExecutor::new(
            Box::new(books()),
            Box::new(authors()),
            "author_id",
            "author.id",
        )?;
        assert_eq!(join.output_schema().len(), 5);

        let rows = collect(&mut join)?;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][4], s("Herbert"));
        assert_eq!(rows[1][4], s("Austen"));
        assert_eq!(rows[2][3], Value::Null);
        assert_eq!(rows[2][4], Value::Null);
        assert_eq!(rows[3][4], s("Austen"));
        Ok(())
    }

    #[test]
    fn test_to_many_join_multiplies_rows() -> Result<()> {
        let authors = MockExecutor::new(
            vec![
                vec![Value::Int64(10), s("Herbert")],
                vec![Value::Int64(20), s("Austen")],
                vec![Value::Int64(30), s("Gibson")],
            ],
            vec![
                ColumnInfo::new("id", DataType::Int64),
                ColumnInfo::new("name", DataType::Varchar),
            ],
        );
        let books = MockExecutor::new(
            vec![
                vec![Value::Int64(1), s("Dune"), Value::Int64(10)],
                vec![Value::Int64(2), s("Emma"), Value::Int64(20)],
                vec![Value::Int64(4), s("Persuasion"), Value::Int64(20)],
            ],
            vec![
                ColumnInfo::new("books.id", DataType::Int64),
                ColumnInfo::new("books.title", DataType::Varchar),
                ColumnInfo::new("books.author_id", DataType::Int64),
            ],
        );

        let mut join =
            HashJoinExecutor::new(Box::new(authors), Box::new(books), "id", "books.author_id")?;
        let rows = collect(&mut join)?;

        // Herbert x1, Austen x2, Gibson padded
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1][3], s("Emma"));
        assert_eq!(rows[2][3], s("Persuasion"));
        assert_eq!(rows[3][1], s("Gibson"));
        assert_eq!(rows[3][2], Value::Null);
        Ok(())
    }

    #[test]
    fn test_key_type_mismatch_rejected() {
        let result = HashJoinExecutor::new(
            Box::new(books()),
            Box::new(authors()),
            "title",
            "author.id",
        );
        assert!(result.is_err());
    }
}
