//! Deterministic fallbacks for every plan section.

use std::collections::HashSet;

use crate::model::{AssociationKind, Field, Relationship, SourceModel};

use super::{
    CodeTransformation, Collection, CollectionField, DomainConcept, FileCategory, MigrationStep,
};

const ARRAY_TYPES: &[&str] = &[
    "List",
    "Set",
    "Collection",
    "Array",
    "ArrayList",
    "LinkedList",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "SortedSet",
    "Iterable",
];

const NUMERIC_TYPES: &[&str] = &[
    "int",
    "Integer",
    "long",
    "Long",
    "short",
    "Short",
    "byte",
    "Byte",
    "double",
    "Double",
    "float",
    "Float",
    "BigDecimal",
    "BigInteger",
    "Number",
    "AtomicInteger",
    "AtomicLong",
];

const DATE_TYPES: &[&str] = &[
    "Date",
    "LocalDate",
    "LocalDateTime",
    "LocalTime",
    "Instant",
    "ZonedDateTime",
    "OffsetDateTime",
    "Timestamp",
    "Calendar",
];

/// One collection per entity.
pub(super) fn collections(model: &SourceModel) -> Vec<Collection> {
    model
        .entities
        .iter()
        .map(|entity| Collection {
            name: entity
                .persisted_name
                .clone()
                .unwrap_or_else(|| format!("{}s", entity.name.to_lowercase())),
            fields: entity
                .fields
                .iter()
                .map(|field| CollectionField {
                    name: field.name.clone(),
                    field_type: document_type(field).to_string(),
                    description: Some(if field.is_identifier {
                        format!("Primary key from {}.{}", entity.name, field.name)
                    } else {
                        format!("From {}.{}", entity.name, field.name)
                    }),
                })
                .collect(),
        })
        .collect()
}

/// Maps a declared type to a document type. Checked in order: identifier,
/// collection wrapper, numeric, date/time.
pub(super) fn document_type(field: &Field) -> &'static str {
    if field.is_identifier {
        return "ObjectId";
    }
    let declared = field.declared_type.trim();
    let base = declared.split('<').next().unwrap_or_default().trim();
    let simple = base.trim_end_matches("[]").rsplit('.').next().unwrap_or_default();

    if declared.ends_with("[]") || ARRAY_TYPES.contains(&simple) {
        "Array"
    } else if NUMERIC_TYPES.contains(&simple) {
        "Number"
    } else if is_temporal(simple) {
        "Date"
    } else {
        "String"
    }
}

fn is_temporal(simple: &str) -> bool {
    let lower = simple.to_lowercase();
    DATE_TYPES.contains(&simple) || lower.contains("date") || lower.contains("time")
}

/// Embedding guidance derived from the relationships.
///
/// Only entity pairs joined by nothing but `ManyToMany` edges are suggested
/// for referencing.
pub(super) fn embedding_strategy(model: &SourceModel) -> String {
    let otherwise_joined: HashSet<(&str, &str)> = model
        .relationships
        .iter()
        .filter(|r| r.kind != AssociationKind::ManyToMany)
        .map(unordered)
        .collect();

    let pairs = |kind: AssociationKind, render: fn(&str, &str) -> String| -> Vec<String> {
        model
            .relationships
            .iter()
            .filter(|r| r.kind == kind && !r.target_entity.is_empty())
            .filter(|r| {
                kind != AssociationKind::ManyToMany || !otherwise_joined.contains(&unordered(r))
            })
            .map(|r| render(&r.source_entity, &r.target_entity))
            .collect()
    };
    let embed = pairs(AssociationKind::ToMany, |source: &str, target: &str| {
        format!("{target} within {source}")
    });
    let reference = pairs(AssociationKind::ManyToMany, |source: &str, target: &str| {
        format!("{source} and {target}")
    });

    let mut parts = Vec::new();
    if !embed.is_empty() {
        parts.push(format!("Embed {} for better read performance.", embed.join(", ")));
    }
    if !reference.is_empty() {
        parts.push(format!(
            "Use references between {} to avoid duplication.",
            reference.join(", ")
        ));
    }
    if parts.is_empty() {
        parts.push(
            "Use embedding for entities with strong parent-child relationships and referencing \
             for many-to-many relationships."
                .to_string(),
        );
    }
    parts.join(" ")
}

fn unordered(r: &Relationship) -> (&str, &str) {
    let (a, b) = (r.source_entity.as_str(), r.target_entity.as_str());
    if a <= b { (a, b) } else { (b, a) }
}

fn transformation(
    category: FileCategory,
    before: &str,
    after: &str,
    explanation: &str,
) -> CodeTransformation {
    CodeTransformation {
        file_category: category,
        before_snippet: before.to_string(),
        after_snippet: after.to_string(),
        explanation: explanation.to_string(),
    }
}

/// The six canonical rewrites.
pub(super) fn transformations() -> Vec<CodeTransformation> {
    vec![
        transformation(
            FileCategory::Entity,
            "@Entity",
            "@Document(collection = \"collection_name\")",
            "Replace JPA entity annotations with MongoDB document annotations",
        ),
        transformation(
            FileCategory::Entity,
            "@GeneratedValue",
            "@Id\nprivate String id;",
            "Replace JPA ID generation with MongoDB ObjectId",
        ),
        transformation(
            FileCategory::Entity,
            "@Column",
            "@Field(\"field_name\")",
            "Replace JPA column annotations with MongoDB field annotations",
        ),
        transformation(
            FileCategory::DataAccess,
            "JpaRepository",
            "MongoRepository",
            "Replace JPA repository with MongoDB repository",
        ),
        transformation(
            FileCategory::DataAccess,
            "@Query(\"SELECT",
            "@Query(\"{field: ?0}\")",
            "Replace JPQL queries with MongoDB queries",
        ),
        transformation(
            FileCategory::Configuration,
            "spring.datasource.url",
            "spring.data.mongodb.uri=mongodb://localhost:27017/db",
            "Replace JPA datasource configuration with MongoDB configuration",
        ),
    ]
}

fn step(order: u32, title: &str, description: &str, example: Option<&str>) -> MigrationStep {
    MigrationStep {
        order,
        title: title.to_string(),
        description: description.to_string(),
        example_snippet: example.map(str::to_string),
    }
}

/// The seven canonical steps.
pub(super) fn steps() -> Vec<MigrationStep> {
    vec![
        step(
            1,
            "Set up MongoDB environment",
            "Install MongoDB and create the necessary databases and users.",
            None,
        ),
        step(
            2,
            "Update dependencies",
            "Replace JPA dependencies with Spring Data MongoDB in pom.xml or build.gradle.",
            Some(
                "<dependency>\n    <groupId>org.springframework.boot</groupId>\n    \
                 <artifactId>spring-boot-starter-data-mongodb</artifactId>\n</dependency>",
            ),
        ),
        step(
            3,
            "Transform entity classes",
            "Convert JPA annotations to MongoDB annotations.",
            None,
        ),
        step(
            4,
            "Update repository interfaces",
            "Change from JPA repositories to MongoDB repositories.",
            None,
        ),
        step(5, "Update configuration", "Replace database configuration properties.", None),
        step(
            6,
            "Migrate data",
            "Write a script to migrate data from the relational database to MongoDB.",
            None,
        ),
        step(7, "Test the application", "Verify that all functionality works with MongoDB.", None),
    ]
}

fn concept(name: &str, description: &str, relevance: &str) -> DomainConcept {
    DomainConcept {
        name: name.to_string(),
        description: description.to_string(),
        relevance: relevance.to_string(),
    }
}

/// The four canonical concepts.
pub(super) fn concepts() -> Vec<DomainConcept> {
    vec![
        concept(
            "Document Model",
            "MongoDB stores data in flexible, JSON-like documents, allowing for nested data and arrays.",
            "Core MongoDB concept",
        ),
        concept(
            "Embedding vs. Referencing",
            "Embedding documents is preferred for one-to-many relationships with strong ownership, \
             while referencing is better for many-to-many relationships.",
            "Data modeling strategy",
        ),
        concept(
            "Indexing",
            "Create indexes on frequently queried fields to improve performance.",
            "Performance optimization",
        ),
        concept(
            "Aggregation Pipeline",
            "Use MongoDB's aggregation framework for complex queries instead of JPQL.",
            "Query capability",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use std::collections::BTreeSet;

    fn field(name: &str, ty: &str) -> Field {
        Field::new(name, ty, BTreeSet::new(), false, None)
    }

    #[test]
    fn type_table() {
        let id = Field::new("id", "Long", BTreeSet::new(), true, None);
        assert_eq!(document_type(&id), "ObjectId");
        assert_eq!(document_type(&field("visits", "List<Integer>")), "Array");
        assert_eq!(document_type(&field("scores", "int[]")), "Array");
        assert_eq!(document_type(&field("age", "Integer")), "Number");
        assert_eq!(document_type(&field("price", "java.math.BigDecimal")), "Number");
        assert_eq!(document_type(&field("born", "LocalDate")), "Date");
        assert_eq!(document_type(&field("seen", "OffsetDateTimeHolder")), "Date");
        assert_eq!(document_type(&field("name", "String")), "String");
        assert_eq!(document_type(&field("owner", "Owner")), "String");
    }

    #[test]
    fn collections_follow_entities() {
        let model = SourceModel {
            entities: vec![
                Entity {
                    name: "Owner".into(),
                    source_path: "Owner.java".into(),
                    fields: vec![
                        Field::new("id", "Long", BTreeSet::new(), true, None),
                        field("city", "String"),
                    ],
                    structural_tags: BTreeSet::new(),
                    persisted_name: None,
                },
                Entity {
                    name: "PetType".into(),
                    source_path: "PetType.java".into(),
                    fields: vec![],
                    structural_tags: BTreeSet::new(),
                    persisted_name: Some("types".into()),
                },
            ],
            ..SourceModel::default()
        };

        let collections = collections(&model);
        assert_eq!(collections[0].name, "owners");
        assert_eq!(collections[1].name, "types");
        assert_eq!(
            collections[0].fields[0].description.as_deref(),
            Some("Primary key from Owner.id")
        );
        assert_eq!(collections[0].fields[1].description.as_deref(), Some("From Owner.city"));
    }

    fn relationship(source: &str, target: &str, kind: AssociationKind) -> Relationship {
        Relationship {
            source_entity: source.into(),
            target_entity: target.into(),
            kind,
            source_field_name: "f".into(),
            target_field_name: None,
        }
    }

    #[test]
    fn embedding_from_relationships() {
        let model = SourceModel {
            relationships: vec![
                relationship("Owner", "Pet", AssociationKind::ToMany),
                relationship("Pet", "Owner", AssociationKind::ToOne),
                relationship("Vet", "Specialty", AssociationKind::ManyToMany),
            ],
            ..SourceModel::default()
        };
        assert_eq!(
            embedding_strategy(&model),
            "Embed Pet within Owner for better read performance. \
             Use references between Vet and Specialty to avoid duplication."
        );
        assert!(embedding_strategy(&SourceModel::default()).starts_with("Use embedding"));
    }

    #[test]
    fn many_to_many_with_other_edges_is_not_referenced() {
        let model = SourceModel {
            relationships: vec![
                relationship("Vet", "Specialty", AssociationKind::ManyToMany),
                relationship("Specialty", "Vet", AssociationKind::ToOne),
                relationship("Vet", "Clinic", AssociationKind::ManyToMany),
            ],
            ..SourceModel::default()
        };
        assert_eq!(
            embedding_strategy(&model),
            "Use references between Vet and Clinic to avoid duplication."
        );

        let model = SourceModel {
            relationships: vec![
                relationship("Vet", "Specialty", AssociationKind::ManyToMany),
                relationship("Vet", "Specialty", AssociationKind::ToMany),
            ],
            ..SourceModel::default()
        };
        assert_eq!(
            embedding_strategy(&model),
            "Embed Specialty within Vet for better read performance."
        );
    }

    #[test]
    fn canonical_sections() {
        assert_eq!(transformations().len(), 6);
        let steps = steps();
        assert_eq!(steps.len(), 7);
        assert!(steps.iter().enumerate().all(|(i, s)| s.order as usize == i + 1));
        assert_eq!(concepts().len(), 4);
    }
}
