//! Attribute declarations of an entity.

use crate::access::DataType;
use serde::{Deserialize, Serialize};

/// How many target rows an association reaches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cardinality", rename_all = "snake_case")]
pub enum Cardinality {
    /// The owning table carries `join_column`, holding the target identifier
    ToOne { join_column: String },
    /// The target table points back through its `mapped_by` association
    ToMany { mapped_by: String },
}

/// Declared type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeType {
    Scalar {
        #[serde(rename = "type")]
        data_type: DataType,
    },
    /// Declared with a generic parameter of the owning type, e.g. `id: K`
    TypeParameter { parameter: String },
    Association {
        target: String,
        #[serde(flatten)]
        cardinality: Cardinality,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(flatten)]
    pub attr_type: AttributeType,
}

impl AttributeInfo {
    pub fn scalar(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Scalar { data_type },
        }
    }

    pub fn type_parameter(name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::TypeParameter {
                parameter: parameter.into(),
            },
        }
    }

    pub fn to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        join_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Association {
                target: target.into(),
                cardinality: Cardinality::ToOne {
                    join_column: join_column.into(),
                },
            },
        }
    }

    pub fn to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        mapped_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attr_type: AttributeType::Association {
                target: target.into(),
                cardinality: Cardinality::ToMany {
                    mapped_by: mapped_by.into(),
                },
            },
        }
    }

    pub fn is_association(&self) -> bool {
        matches!(self.attr_type, AttributeType::Association { .. })
    }

    /// Target entity of an association attribute
    pub fn target(&self) -> Option<&str> {
        match &self.attr_type {
            AttributeType::Association { target, .. } => Some(target),
            _ => None,
        }
    }
}
