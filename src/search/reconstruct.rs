//! Turning aliased result rows back into entities.
//!
//! A [`RowReconstructor`] creates an empty entity and assigns each aliased
//! value to it. [`SecondaryReconstructor`]s then see the same row and may
//! attach one association; an association that came back empty stays unset.

use crate::access::{ResultRow, Value};
use serde_json::{Map, Value as Json};

/// Entities that can tell whether reconstruction left them without data
pub trait Reconstruct {
    fn is_empty(&self) -> bool;
}

pub trait RowReconstructor: Send + Sync {
    type Entity;

    fn new_entity(&self) -> Self::Entity;

    /// Assign one aliased value; aliases the entity has no slot for are ignored
    fn assign(&self, entity: &mut Self::Entity, alias: &str, value: &Value);

    fn secondaries(&self) -> &[Box<dyn SecondaryReconstructor<Self::Entity>>] {
        &[]
    }

    fn reconstruct(&self, row: &ResultRow) -> Self::Entity {
        let mut entity = self.new_entity();
        for (alias, value) in row.iter() {
            self.assign(&mut entity, alias, value);
        }
        for secondary in self.secondaries() {
            secondary.apply(&mut entity, row);
        }
        entity
    }
}

pub trait SecondaryReconstructor<E>: Send + Sync {
    fn apply(&self, entity: &mut E, row: &ResultRow);
}

/// Builds an association with its own reconstructor and hands it to a setter
pub struct AssociationReconstructor<R, F> {
    inner: R,
    setter: F,
}

impl<R, F> AssociationReconstructor<R, F> {
    pub fn new(inner: R, setter: F) -> Self {
        Self { inner, setter }
    }
}

impl<E, R, F> SecondaryReconstructor<E> for AssociationReconstructor<R, F>
where
    R: RowReconstructor,
    R::Entity: Reconstruct,
    F: Fn(&mut E, R::Entity) + Send + Sync,
{
    fn apply(&self, entity: &mut E, row: &ResultRow) {
        let association = self.inner.reconstruct(row);
        if !association.is_empty() {
            (self.setter)(entity, association);
        }
    }
}

impl Reconstruct for Json {
    fn is_empty(&self) -> bool {
        match self {
            Json::Null => true,
            Json::Object(map) => map.values().all(Reconstruct::is_empty),
            _ => false,
        }
    }
}

/// Nests dotted aliases into JSON objects.
///
/// `book.author.name` under root path `book` becomes
/// `{"author": {"name": ...}}`. Nested objects whose values are all null are
/// replaced by null.
#[derive(Debug, Clone)]
pub struct JsonReconstructor {
    root_path: String,
}

impl JsonReconstructor {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    fn prune(map: &mut Map<String, Json>) {
        for value in map.values_mut() {
            if let Json::Object(nested) = value {
                Self::prune(nested);
                if nested.values().all(Json::is_null) {
                    *value = Json::Null;
                }
            }
        }
    }
}

impl RowReconstructor for JsonReconstructor {
    type Entity = Json;

    fn new_entity(&self) -> Json {
        Json::Object(Map::new())
    }

    fn assign(&self, entity: &mut Json, alias: &str, value: &Value) {
        let relative = alias
            .strip_prefix(self.root_path.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(alias);

        let mut segments: Vec<&str> = relative.split('.').collect();
        let Some(leaf) = segments.pop() else {
            return;
        };
        let mut current = entity;
        for segment in segments {
            let Json::Object(map) = current else {
                return;
            };
            let slot = map
                .entry(segment.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            if !slot.is_object() {
                *slot = Json::Object(Map::new());
            }
            current = slot;
        }
        if let Json::Object(map) = current {
            map.insert(leaf.to_string(), value.to_json());
        }
    }

    fn reconstruct(&self, row: &ResultRow) -> Json {
        let mut entity = self.new_entity();
        for (alias, value) in row.iter() {
            self.assign(&mut entity, alias, value);
        }
        if let Json::Object(map) = &mut entity {
            Self::prune(map);
        }
        entity
    }
}
