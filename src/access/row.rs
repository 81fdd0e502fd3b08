use crate::access::Value;
use serde_json::Map;

/// One result row: values keyed by alias, in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    entries: Vec<(String, Value)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from parallel alias and value lists
    pub fn from_parts(aliases: &[String], values: Vec<Value>) -> Self {
        Self {
            entries: aliases.iter().cloned().zip(values).collect(),
        }
    }

    /// Insert or replace the value stored under `alias`
    pub fn insert(&mut self, alias: impl Into<String>, value: Value) {
        let alias = alias.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((alias, value)),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, v)| v)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(a, v)| (a.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flat JSON object keyed by alias
    pub fn to_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(a, v)| (a.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for ResultRow {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut row = ResultRow::new();
        for (alias, value) in iter {
            row.insert(alias, value);
        }
        row
    }
}
