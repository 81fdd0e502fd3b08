//! Field remapping and value transformation hooks applied while compiling filters.

use crate::access::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A field name together with the value it is compared against
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValuePair {
    pub field: String,
    pub value: Value,
}

impl FieldValuePair {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Hooks letting a caller rename filter fields and rewrite their literals.
///
/// When `transform_field` renames a field, the literal compared against it
/// passes through `transform_value` with the original field name. Returning
/// `None`, or a pair holding NULL, keeps the literal unchanged.
pub trait FieldValueTransformer: Send + Sync {
    fn transform_field(&self, _entity: &str, _field: &str) -> Option<String> {
        None
    }

    fn transform_value(&self, _field: &str, _value: &Value) -> Option<FieldValuePair> {
        None
    }
}

/// Leaves every field and value as is
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl FieldValueTransformer for IdentityTransformer {}

type ValueHook = Arc<dyn Fn(&str, &Value) -> Option<Value> + Send + Sync>;

/// Table-driven transformer: `(entity, field)` renames plus an optional value hook
#[derive(Clone, Default)]
pub struct FieldRemapper {
    fields: HashMap<(String, String), String>,
    values: Option<ValueHook>,
}

impl FieldRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `field` of `entity` from `column` instead
    pub fn remap(
        mut self,
        entity: impl Into<String>,
        field: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.fields
            .insert((entity.into(), field.into()), column.into());
        self
    }

    pub fn with_value_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.values = Some(Arc::new(hook));
        self
    }
}

impl FieldValueTransformer for FieldRemapper {
    fn transform_field(&self, entity: &str, field: &str) -> Option<String> {
        self.fields
            .get(&(entity.to_string(), field.to_string()))
            .cloned()
    }

    fn transform_value(&self, field: &str, value: &Value) -> Option<FieldValuePair> {
        let hook = self.values.as_ref()?;
        hook(field, value).map(|v| FieldValuePair::new(field, v))
    }
}
