//! Entity metadata structures.

use crate::access::DataType;
use crate::catalog::attribute_info::{AttributeInfo, AttributeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_id_attribute() -> String {
    "id".to_string()
}

/// Declared shape of one domain type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    /// Backing table; defaults to the entity name
    #[serde(default)]
    pub table: Option<String>,
    /// Path prefixes under which callers address this entity as a search root
    #[serde(default)]
    pub root_paths: Vec<String>,
    /// Supertype this entity inherits attributes and overrides from
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    /// Attributes declared directly on this type, in declaration order
    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,
    /// Logical attribute name to physical column name
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    /// Bindings for type parameters declared by supertypes
    #[serde(default)]
    pub type_arguments: BTreeMap<String, DataType>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            root_paths: Vec::new(),
            parent: None,
            id_attribute: default_id_attribute(),
            attributes: Vec::new(),
            overrides: BTreeMap::new(),
            type_arguments: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_paths.push(path.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_id_attribute(mut self, id: impl Into<String>) -> Self {
        self.id_attribute = id.into();
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_override(mut self, attribute: impl Into<String>, column: impl Into<String>) -> Self {
        self.overrides.insert(attribute.into(), column.into());
        self
    }

    pub fn with_type_argument(mut self, parameter: impl Into<String>, data_type: DataType) -> Self {
        self.type_arguments.insert(parameter.into(), data_type);
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    /// Primary root path, used to prefix entity-mode result aliases
    pub fn primary_root_path(&self) -> String {
        self.root_paths
            .first()
            .cloned()
            .unwrap_or_else(|| lower_first(&self.name))
    }

    /// Attribute declared directly on this type
    pub fn declared_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn declares_type_parameter(&self, parameter: &str) -> bool {
        self.attributes.iter().any(|a| {
            matches!(&a.attr_type, AttributeType::TypeParameter { parameter: p } if p == parameter)
        })
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let entity = EntityMetadata::new("BookReview");
        assert_eq!(entity.table_name(), "BookReview");
        assert_eq!(entity.primary_root_path(), "bookReview");
        assert_eq!(entity.id_attribute, "id");

        let entity = entity.with_table("reviews").with_root_path("review");
        assert_eq!(entity.table_name(), "reviews");
        assert_eq!(entity.primary_root_path(), "review");
    }

    #[test]
    fn test_deserialize_entity() -> serde_json::Result<()> {
        let entity: EntityMetadata = serde_json::from_value(json!({
            "name": "Pet",
            "parent": "BaseEntity",
            "root_paths": ["pet", "pets"],
            "attributes": [
                {"name": "name", "kind": "scalar", "type": "varchar"},
                {"name": "owner", "kind": "association", "target": "Owner",
                 "cardinality": "to_one", "join_column": "owner_id"}
            ],
            "overrides": {"owner": "owner_id"},
            "type_arguments": {"K": "uuid"}
        }))?;

        assert_eq!(entity.parent.as_deref(), Some("BaseEntity"));
        assert_eq!(entity.attributes.len(), 2);
        assert_eq!(entity.overrides.get("owner").map(String::as_str), Some("owner_id"));
        assert_eq!(entity.type_arguments.get("K"), Some(&DataType::Uuid));
        assert!(entity.declared_attribute("owner").is_some());
        assert!(entity.declared_attribute("id").is_none());
        Ok(())
    }
}
