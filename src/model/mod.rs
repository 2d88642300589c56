//! Source model: the structural snapshot recovered from a scanned codebase.
//!
//! Built once per analysis run by [`crate::extract`], enriched once by
//! [`crate::resolve`], and read-only afterwards.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root aggregate of an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceModel {
    /// Persistent entities, unique by name, in walk order.
    pub entities: Vec<Entity>,
    /// Repository / DAO style data-access units, in walk order.
    pub data_access_units: Vec<DataAccessUnit>,
    /// Persistence-related configuration files, in walk order.
    pub configurations: Vec<ConfigurationFile>,
    /// Directed relationships derived from association fields.
    pub relationships: Vec<Relationship>,
}

impl SourceModel {
    /// Looks up an entity by exact name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Total number of association fields across all entities.
    #[must_use]
    pub fn association_field_count(&self) -> usize {
        self.entities.iter().map(Entity::association_count).sum()
    }
}

/// A persistent type recovered from an annotated declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Declared type name, or the file stem when no declaration was found.
    pub name: String,
    /// Path of the declaring file, relative to the analyzed root.
    pub source_path: String,
    /// Fields in declaration order; names are unique within the entity.
    pub fields: Vec<Field>,
    /// Annotation markers found on the type declaration.
    pub structural_tags: BTreeSet<String>,
    /// Explicit table or collection name, when one is declared.
    pub persisted_name: Option<String>,
}

impl Entity {
    /// Number of fields flagged as associations.
    #[must_use]
    pub fn association_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_association).count()
    }

    /// Fields flagged as identifiers.
    pub fn identifier_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_identifier)
    }
}

/// Cardinality of an association field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssociationKind {
    /// One owner, many targets (`@OneToMany`).
    ToMany,
    /// A single target (`@ManyToOne`, `@OneToOne`).
    ToOne,
    /// Many owners, many targets (`@ManyToMany`).
    ManyToMany,
}

impl AssociationKind {
    /// Maps an annotation marker to the association kind it declares.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "OneToMany" => Some(Self::ToMany),
            "ManyToOne" | "OneToOne" => Some(Self::ToOne),
            "ManyToMany" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ToMany => "ToMany",
            Self::ToOne => "ToOne",
            Self::ManyToMany => "ManyToMany",
        };
        f.write_str(label)
    }
}

/// A field declared on an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    /// Field identifier.
    pub name: String,
    /// Raw type token, generics included (e.g. `Set<Pet>`).
    pub declared_type: String,
    /// Annotation markers attached to the field.
    pub tags: BTreeSet<String>,
    /// True if any identifier marker is present.
    pub is_identifier: bool,
    /// True if an association marker is present.
    pub is_association: bool,
    /// Set exactly when `is_association` is true.
    pub association_kind: Option<AssociationKind>,
    /// Referenced entity, when known.
    pub target_entity_name: Option<String>,
    /// Inverse field named by a `mappedBy` argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,
}

impl Field {
    /// Creates a field, deriving the association flag from `association_kind`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        tags: BTreeSet<String>,
        is_identifier: bool,
        association_kind: Option<AssociationKind>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            tags,
            is_identifier,
            is_association: association_kind.is_some(),
            association_kind,
            target_entity_name: None,
            mapped_by: None,
        }
    }

    /// Sets the referenced entity name.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_entity_name = Some(target.into());
        self
    }
}

/// A repository or DAO style interface/class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataAccessUnit {
    /// Declared type name.
    pub name: String,
    /// Path of the declaring file, relative to the analyzed root.
    pub source_path: String,
    /// Best-effort match against the entity this unit serves.
    pub associated_entity_name: Option<String>,
    /// Parent types named in the `extends` clause.
    pub base_interfaces: BTreeSet<String>,
    /// Declared operations in source order.
    pub operations: Vec<Operation>,
}

/// Base repository types that provide standard CRUD operations.
const CRUD_BASES: &[&str] = &[
    "CrudRepository",
    "JpaRepository",
    "PagingAndSortingRepository",
    "ListCrudRepository",
    "ListPagingAndSortingRepository",
    "Repository",
];

impl DataAccessUnit {
    /// Returns `true` if the unit inherits standard CRUD capability.
    #[must_use]
    pub fn has_standard_crud(&self) -> bool {
        self.base_interfaces.iter().any(|b| CRUD_BASES.contains(&b.as_str()))
    }

    /// Number of operations carrying a custom query.
    #[must_use]
    pub fn custom_query_count(&self) -> usize {
        self.operations.iter().filter(|o| o.custom_query.is_some()).count()
    }
}

/// A method declared on a data-access unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    /// Method name.
    pub name: String,
    /// Raw return type token.
    pub return_type: String,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Query string from an attached `@Query` marker.
    pub custom_query: Option<String>,
}

/// A single method parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Raw type token.
    pub declared_type: String,
}

/// Format family of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    /// Java `.properties`.
    Properties,
    /// XML descriptors (`persistence.xml`, `hibernate.cfg.xml`, ...).
    Xml,
    /// `.yml` / `.yaml`.
    Yaml,
}

impl ConfigKind {
    /// Maps a lowercase file extension to a configuration kind.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "properties" => Some(Self::Properties),
            "xml" => Some(Self::Xml),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Properties => "properties",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
        };
        f.write_str(label)
    }
}

/// A configuration file holding persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigurationFile {
    /// Path relative to the analyzed root.
    pub source_path: String,
    /// Format family.
    pub kind: ConfigKind,
    /// Full file content.
    pub raw_content: String,
}

/// A directed association between two entities, one per association field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    /// Entity declaring the association field.
    pub source_entity: String,
    /// Referenced entity.
    pub target_entity: String,
    /// Association cardinality.
    pub kind: AssociationKind,
    /// Field on the source entity.
    pub source_field_name: String,
    /// Inverse field on the target, when declared via `mappedBy`.
    pub target_field_name: Option<String>,
}
