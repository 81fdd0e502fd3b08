//! Field path resolution against entity metadata.

use crate::access::DataType;
use crate::catalog::attribute_info::{AttributeInfo, AttributeType, Cardinality};
use crate::catalog::entity_info::EntityMetadata;
use crate::catalog::path::FieldPath;
use crate::catalog::EntityMetadataProvider;
use crate::error::{SearchError, SearchResult};
use log::trace;

/// What a resolved path points at
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(DataType),
    Association {
        target: String,
        cardinality: Cardinality,
    },
}

/// One association traversed on the way to a field
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    /// Dotted path of the association from the search root
    pub path: String,
    pub source: String,
    pub attribute: String,
    pub target: String,
    pub cardinality: Cardinality,
}

/// A field path resolved from a root entity
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub path: FieldPath,
    /// Entity the terminal attribute was looked up on
    pub owner: String,
    pub attribute: String,
    /// Physical column name, after overrides
    pub column: String,
    pub kind: FieldKind,
    pub overridden: bool,
    /// Associations traversed by the non-terminal segments
    pub joins: Vec<JoinStep>,
}

impl ResolvedField {
    /// True when the field needs a join to be read
    pub fn is_complex(&self) -> bool {
        matches!(self.kind, FieldKind::Association { .. })
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self.kind {
            FieldKind::Scalar(dt) => Some(dt),
            FieldKind::Association { .. } => None,
        }
    }

    /// Dotted path of the association this field is read from, `None` for the root
    pub fn source_path(&self) -> Option<&str> {
        self.joins.last().map(|j| j.path.as_str())
    }

    /// Column name in the joined row layout
    pub fn column_path(&self) -> String {
        match self.source_path() {
            Some(source) => format!("{}.{}", source, self.column),
            None => self.column.clone(),
        }
    }
}

/// Resolves dotted field paths and attribute types through the declaration hierarchy
pub struct FieldPathResolver<'a, P: EntityMetadataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: EntityMetadataProvider + ?Sized> FieldPathResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Resolve `path` starting from `root`
    pub fn resolve(&self, root: &str, path: &FieldPath) -> SearchResult<ResolvedField> {
        let unresolvable = || SearchError::UnresolvableFieldPath {
            entity: root.to_string(),
            path: path.to_string(),
        };

        let mut entity = root.to_string();
        let mut joins: Vec<JoinStep> = Vec::new();
        let segments = path.segments();

        for (i, segment) in segments.iter().enumerate() {
            let attribute = self.find_attribute(&entity, segment).ok_or_else(unresolvable)?;
            let column_override = self.find_override(&entity, segment);

            if i + 1 < segments.len() {
                match (&attribute.attr_type, column_override) {
                    (AttributeType::Association { target, cardinality }, None) => {
                        joins.push(JoinStep {
                            path: segments[..=i].join("."),
                            source: entity.clone(),
                            attribute: segment.clone(),
                            target: target.clone(),
                            cardinality: cardinality.clone(),
                        });
                        entity = target.clone();
                    }
                    _ => return Err(unresolvable()),
                }
                continue;
            }

            let kind = match &attribute.attr_type {
                AttributeType::Scalar { data_type } => FieldKind::Scalar(*data_type),
                AttributeType::TypeParameter { parameter } => {
                    FieldKind::Scalar(self.bind_type_parameter(&entity, parameter)?)
                }
                AttributeType::Association { target, .. } if column_override.is_some() => {
                    FieldKind::Scalar(self.id_type(target)?)
                }
                AttributeType::Association {
                    target,
                    cardinality,
                } => FieldKind::Association {
                    target: target.clone(),
                    cardinality: cardinality.clone(),
                },
            };

            trace!("resolved {}.{} as {:?}", root, path, kind);
            return Ok(ResolvedField {
                path: path.clone(),
                owner: entity,
                attribute: segment.clone(),
                column: column_override.unwrap_or(segment.as_str()).to_string(),
                kind,
                overridden: column_override.is_some(),
                joins,
            });
        }

        Err(unresolvable())
    }

    /// Resolve a dotted path string
    pub fn resolve_str(&self, root: &str, path: &str) -> SearchResult<ResolvedField> {
        let parsed = FieldPath::parse(path).ok_or_else(|| SearchError::UnresolvableFieldPath {
            entity: root.to_string(),
            path: path.to_string(),
        })?;
        self.resolve(root, &parsed)
    }

    /// Metadata of `entity` followed by its supertypes, most-derived first
    pub fn hierarchy(&self, entity: &str) -> impl Iterator<Item = &'a EntityMetadata> + 'a {
        let provider = self.provider;
        std::iter::successors(provider.entity(entity), move |current| {
            current.parent.as_deref().and_then(|p| provider.entity(p))
        })
    }

    /// First declaration of `name` walking from most-derived to least-derived
    pub fn find_attribute(&self, entity: &str, name: &str) -> Option<&'a AttributeInfo> {
        self.hierarchy(entity)
            .find_map(|meta| meta.declared_attribute(name))
    }

    /// First column override for `name` in the hierarchy
    pub fn find_override(&self, entity: &str, name: &str) -> Option<&'a str> {
        self.hierarchy(entity)
            .find_map(|meta| meta.overrides.get(name).map(String::as_str))
    }

    /// Physical column for `name`: its override if declared, else the name itself
    pub fn column_name<'n>(&self, entity: &str, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.find_override(entity, name).unwrap_or(name)
    }

    /// Concrete type bound to `parameter` as seen from `entity`
    pub fn bind_type_parameter(&self, entity: &str, parameter: &str) -> SearchResult<DataType> {
        self.hierarchy(entity)
            .find_map(|meta| meta.type_arguments.get(parameter).copied())
            .or_else(|| self.provider.fallback_key_type())
            .ok_or_else(|| {
                SearchError::Catalog(format!(
                    "type parameter '{}' is unbound for entity '{}'",
                    parameter, entity
                ))
            })
    }

    /// Declared type of the identifier attribute of `entity`
    pub fn id_type(&self, entity: &str) -> SearchResult<DataType> {
        let id = self.id_attribute(entity)?;
        match &id.attr_type {
            AttributeType::Scalar { data_type } => Ok(*data_type),
            AttributeType::TypeParameter { parameter } => {
                self.bind_type_parameter(entity, parameter)
            }
            AttributeType::Association { .. } => Err(SearchError::Catalog(format!(
                "identifier of '{}' cannot be an association",
                entity
            ))),
        }
    }

    pub fn id_attribute(&self, entity: &str) -> SearchResult<&'a AttributeInfo> {
        let meta = self
            .provider
            .entity(entity)
            .ok_or_else(|| SearchError::Catalog(format!("unknown entity '{}'", entity)))?;
        self.find_attribute(entity, &meta.id_attribute)
            .ok_or_else(|| {
                SearchError::Catalog(format!(
                    "identifier attribute '{}' not declared for '{}'",
                    meta.id_attribute, entity
                ))
            })
    }

    /// Every attribute visible on `entity`, supertypes first, shadowed ones dropped
    pub fn visible_attributes(&self, entity: &str) -> Vec<&'a AttributeInfo> {
        let chain: Vec<&EntityMetadata> = self.hierarchy(entity).collect();
        let mut attributes: Vec<&AttributeInfo> = Vec::new();
        for meta in chain.iter().rev() {
            for attribute in &meta.attributes {
                match attributes.iter().position(|a| a.name == attribute.name) {
                    Some(pos) => attributes[pos] = attribute,
                    None => attributes.push(attribute),
                }
            }
        }
        attributes
    }

    /// Resolve every scalar-readable attribute of the entity reached by `prefix`.
    ///
    /// Overridden associations count as scalars; plain associations are skipped.
    pub fn scalar_fields(
        &self,
        root: &str,
        prefix: Option<&FieldPath>,
    ) -> SearchResult<Vec<ResolvedField>> {
        let entity = match prefix {
            Some(p) => match self.resolve(root, p)?.kind {
                FieldKind::Association { target, .. } => target,
                FieldKind::Scalar(_) => {
                    return Err(SearchError::UnresolvableFieldPath {
                        entity: root.to_string(),
                        path: p.to_string(),
                    })
                }
            },
            None => root.to_string(),
        };

        let mut fields = Vec::new();
        for attribute in self.visible_attributes(&entity) {
            let path = FieldPath::extend(prefix, &attribute.name);
            let field = self.resolve(root, &path)?;
            if !field.is_complex() {
                fields.push(field);
            }
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;

    #[test]
    fn test_resolve_scalar_on_root() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        let field = resolver.resolve_str("Book", "title")?;
        assert_eq!(field.data_type(), Some(DataType::Varchar));
        assert!(!field.is_complex());
        assert_eq!(field.column_path(), "title");
        assert!(field.joins.is_empty());
        Ok(())
    }

    #[test]
    fn test_resolve_through_associations() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        let field = resolver.resolve_str("Book", "author.publisher.name")?;
        assert_eq!(field.owner, "Publisher");
        assert_eq!(field.column_path(), "author.publisher.name");
        let paths: Vec<&str> = field.joins.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(paths, vec!["author", "author.publisher"]);

        let author = resolver.resolve_str("Book", "author")?;
        assert!(author.is_complex());
        Ok(())
    }

    #[test]
    fn test_unknown_field_is_unresolvable() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        for path in ["unknownField", "title.length", "author.missing", ""] {
            assert!(matches!(
                resolver.resolve_str("Book", path),
                Err(SearchError::UnresolvableFieldPath { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn test_type_parameter_binding() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        assert_eq!(
            resolver.resolve_str("Owner", "id")?.data_type(),
            Some(DataType::Uuid)
        );
        assert_eq!(
            resolver.resolve_str("Book", "id")?.data_type(),
            Some(DataType::Int64)
        );
        // Pet binds no argument, so the fallback key type applies
        assert_eq!(
            resolver.resolve_str("Pet", "id")?.data_type(),
            catalog.fallback_key_type()
        );
        Ok(())
    }

    #[test]
    fn test_overridden_association_is_scalar() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        let owner = resolver.resolve_str("Pet", "owner")?;
        assert!(!owner.is_complex());
        assert!(owner.overridden);
        assert_eq!(owner.column, "owner_id");
        assert_eq!(owner.data_type(), Some(DataType::Uuid));

        // An overridden association cannot be traversed
        assert!(resolver.resolve_str("Pet", "owner.name").is_err());
        Ok(())
    }

    #[test]
    fn test_visible_attributes_order() -> SearchResult<()> {
        let catalog = library_catalog()?;
        let resolver = FieldPathResolver::new(&catalog);

        let names: Vec<&str> = resolver
            .visible_attributes("Publisher")
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "name", "country"]);

        let fields = resolver.scalar_fields("Book", Some(&FieldPath::single("author")))?;
        let columns: Vec<String> = fields.iter().map(|f| f.column_path()).collect();
        assert_eq!(columns, vec!["author.id", "author.name", "author.born"]);
        Ok(())
    }
}
