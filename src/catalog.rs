//! Entity catalog: the static metadata registry every search resolves against.
//!
//! The catalog is built once at startup (from code or a JSON definition),
//! validated, and then shared read-only between requests behind an `Arc`.

pub mod attribute_info;
pub mod entity_info;
pub mod path;
pub mod resolver;

pub use attribute_info::{AttributeInfo, AttributeType, Cardinality};
pub use entity_info::EntityMetadata;
pub use path::FieldPath;
pub use resolver::{FieldKind, FieldPathResolver, JoinStep, ResolvedField};

use crate::access::DataType;
use crate::error::{SearchError, SearchResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Source of entity metadata for resolution
pub trait EntityMetadataProvider: Send + Sync {
    fn entity(&self, name: &str) -> Option<&EntityMetadata>;

    /// Key type used when a type parameter has no binding in the hierarchy
    fn fallback_key_type(&self) -> Option<DataType> {
        None
    }
}

/// Serialized form of a catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub fallback_key_type: Option<DataType>,
    pub entities: Vec<EntityMetadata>,
}

/// Immutable, validated set of entity metadata
#[derive(Debug)]
pub struct Catalog {
    entities: HashMap<String, EntityMetadata>,
    fallback_key_type: Option<DataType>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn from_definition(definition: CatalogDefinition) -> SearchResult<Self> {
        let mut builder = Catalog::builder();
        if let Some(key_type) = definition.fallback_key_type {
            builder = builder.fallback_key_type(key_type);
        }
        for entity in definition.entities {
            builder = builder.entity(entity);
        }
        builder.build()
    }

    /// Load a catalog definition from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SearchResult<Self> {
        Self::load_with_fallback(path, None)
    }

    /// Load a JSON definition, using `fallback` when the file names no key type
    pub fn load_with_fallback(
        path: impl AsRef<Path>,
        fallback: Option<DataType>,
    ) -> SearchResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut definition: CatalogDefinition = serde_json::from_str(&text).map_err(|e| {
            SearchError::Catalog(format!("cannot parse {}: {}", path.display(), e))
        })?;
        if definition.fallback_key_type.is_none() {
            definition.fallback_key_type = fallback;
        }
        let catalog = Self::from_definition(definition)?;
        info!(
            "Loaded catalog with {} entities from {}",
            catalog.entities.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Look up an entity by name
    pub fn get_entity(&self, name: &str) -> SearchResult<&EntityMetadata> {
        self.entities
            .get(name)
            .ok_or_else(|| SearchError::Catalog(format!("unknown entity '{}'", name)))
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Find the entity addressed by a root path such as `book`
    pub fn entity_for_root_path(&self, root_path: &str) -> Option<&EntityMetadata> {
        self.entities
            .values()
            .find(|e| e.root_paths.iter().any(|p| p == root_path))
    }

    pub fn resolver(&self) -> FieldPathResolver<'_, Self> {
        FieldPathResolver::new(self)
    }
}

impl EntityMetadataProvider for Catalog {
    fn entity(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }

    fn fallback_key_type(&self) -> Option<DataType> {
        self.fallback_key_type
    }
}

/// Collects entity metadata and validates it as a whole
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entities: Vec<EntityMetadata>,
    fallback_key_type: Option<DataType>,
}

impl CatalogBuilder {
    pub fn entity(mut self, entity: EntityMetadata) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn fallback_key_type(mut self, key_type: DataType) -> Self {
        self.fallback_key_type = Some(key_type);
        self
    }

    pub fn build(self) -> SearchResult<Catalog> {
        let mut entities = HashMap::new();
        for entity in self.entities {
            if entities.contains_key(&entity.name) {
                return Err(SearchError::Catalog(format!(
                    "entity '{}' declared twice",
                    entity.name
                )));
            }
            entities.insert(entity.name.clone(), entity);
        }

        let catalog = Catalog {
            entities,
            fallback_key_type: self.fallback_key_type,
        };
        validate(&catalog)?;
        debug!("Catalog validated: {} entities", catalog.entities.len());
        Ok(catalog)
    }
}

fn validate(catalog: &Catalog) -> SearchResult<()> {
    let resolver = catalog.resolver();

    for entity in catalog.entities.values() {
        check_hierarchy(catalog, entity)?;
    }

    for entity in catalog.entities.values() {
        resolver.id_type(&entity.name)?;

        for attribute in resolver.visible_attributes(&entity.name) {
            match &attribute.attr_type {
                AttributeType::Scalar { .. } => {}
                AttributeType::TypeParameter { parameter } => {
                    resolver.bind_type_parameter(&entity.name, parameter)?;
                }
                AttributeType::Association {
                    target,
                    cardinality,
                } => {
                    if catalog.entity(target).is_none() {
                        return Err(SearchError::Catalog(format!(
                            "association '{}.{}' targets unknown entity '{}'",
                            entity.name, attribute.name, target
                        )));
                    }
                    if let Cardinality::ToMany { mapped_by } = cardinality {
                        check_mapped_by(catalog, &entity.name, &attribute.name, target, mapped_by)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_hierarchy(catalog: &Catalog, entity: &EntityMetadata) -> SearchResult<()> {
    let mut seen = vec![entity.name.as_str()];
    let mut current = entity;
    while let Some(parent) = current.parent.as_deref() {
        if seen.contains(&parent) {
            return Err(SearchError::Catalog(format!(
                "inheritance cycle through '{}'",
                parent
            )));
        }
        current = catalog.entity(parent).ok_or_else(|| {
            SearchError::Catalog(format!(
                "entity '{}' extends unknown entity '{}'",
                current.name, parent
            ))
        })?;
        seen.push(parent);
    }
    Ok(())
}

fn check_mapped_by(
    catalog: &Catalog,
    owner: &str,
    attribute: &str,
    target: &str,
    mapped_by: &str,
) -> SearchResult<()> {
    let back = catalog.resolver().find_attribute(target, mapped_by);
    match back.map(|a| &a.attr_type) {
        Some(AttributeType::Association {
            target: back_target,
            cardinality: Cardinality::ToOne { .. },
        }) if back_target == owner => Ok(()),
        _ => Err(SearchError::Catalog(format!(
            "'{}.{}' is mapped by '{}.{}', which is not a to-one association back to '{}'",
            owner, attribute, target, mapped_by, owner
        ))),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Library domain used across unit tests.
    ///
    /// `BaseEntity` declares a generic `id: K`; Pet binds no argument and
    /// stores its owner through an override column.
    pub(crate) fn library_catalog() -> SearchResult<Catalog> {
        Catalog::builder()
            .fallback_key_type(DataType::Int64)
            .entity(
                EntityMetadata::new("BaseEntity").with_attribute(AttributeInfo::type_parameter("id", "K")),
            )
            .entity(
                EntityMetadata::new("Publisher")
                    .with_table("publishers")
                    .with_root_path("publisher")
                    .with_parent("BaseEntity")
                    .with_type_argument("K", DataType::Int64)
                    .with_attribute(AttributeInfo::scalar("name", DataType::Varchar))
                    .with_attribute(AttributeInfo::scalar("country", DataType::Varchar)),
            )
            .entity(
                EntityMetadata::new("Author")
                    .with_table("authors")
                    .with_root_path("author")
                    .with_root_path("authors")
                    .with_parent("BaseEntity")
                    .with_type_argument("K", DataType::Int64)
                    .with_attribute(AttributeInfo::scalar("name", DataType::Varchar))
                    .with_attribute(AttributeInfo::scalar("born", DataType::Date))
                    .with_attribute(AttributeInfo::to_one("publisher", "Publisher", "publisher_id"))
                    .with_attribute(AttributeInfo::to_many("books", "Book", "author")),
            )
            .entity(
                EntityMetadata::new("Book")
                    .with_table("books")
                    .with_root_path("book")
                    .with_root_path("books")
                    .with_parent("BaseEntity")
                    .with_type_argument("K", DataType::Int64)
                    .with_attribute(AttributeInfo::scalar("title", DataType::Varchar))
                    .with_attribute(AttributeInfo::scalar("price", DataType::Float64))
                    .with_attribute(AttributeInfo::scalar("pages", DataType::Int32))
                    .with_attribute(AttributeInfo::scalar("category", DataType::Varchar))
                    .with_attribute(AttributeInfo::scalar("published", DataType::Date))
                    .with_attribute(AttributeInfo::scalar("isbn", DataType::Uuid))
                    .with_attribute(AttributeInfo::to_one("author", "Author", "author_id")),
            )
            .entity(
                EntityMetadata::new("Owner")
                    .with_table("owners")
                    .with_root_path("owner")
                    .with_parent("BaseEntity")
                    .with_type_argument("K", DataType::Uuid)
                    .with_attribute(AttributeInfo::scalar("name", DataType::Varchar))
                    .with_attribute(AttributeInfo::to_many("pets", "Pet", "owner")),
            )
            .entity(
                EntityMetadata::new("Pet")
                    .with_table("pets")
                    .with_root_path("pet")
                    .with_parent("BaseEntity")
                    .with_attribute(AttributeInfo::scalar("name", DataType::Varchar))
                    .with_attribute(AttributeInfo::scalar("adopted", DataType::DateTimeOffset))
                    .with_attribute(AttributeInfo::to_one("owner", "Owner", "owner_id"))
                    .with_override("owner", "owner_id"),
            )
            .build()
    }
}
