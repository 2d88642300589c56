//! Recommendation → plan normalization.

use std::borrow::Cow;

use serde_json::Value;

use super::{
    defaults, sections, CodeTransformation, Collection, CollectionField, DomainConcept,
    FileCategory, MigrationStep, NormalizedPlan, TargetSchema,
};
use crate::model::SourceModel;
use crate::recommend::{
    CollectionSpec, ConceptItem, Recommendation, SchemaSection, StepItem, TransformationItem,
};

const NO_EXPLANATION: &str = "No explanation provided";
const GENERAL_RELEVANCE: &str = "General MongoDB concept";

/// Builds a complete plan from a recommendation of any shape.
///
/// Each section is taken from the recommendation when it yields at least one
/// item and falls back to its default otherwise; the summary is computed
/// last from the final sections.
#[must_use]
pub fn normalize(recommendation: &Recommendation, model: &SourceModel) -> NormalizedPlan {
    let payload = match recommendation {
        Recommendation::WellFormed(payload) => Cow::Borrowed(payload),
        Recommendation::Unstructured(text) => Cow::Owned(sections::split(text)),
    };

    let target_schema = schema(payload.mongodb_schema.as_ref(), model);

    let code_transformations = or_default(
        "code_transformations",
        payload
            .code_transformations
            .as_deref()
            .map(|items| transformations(items, model))
            .unwrap_or_default(),
        defaults::transformations,
    );
    let steps = or_default(
        "migration_steps",
        payload.migration_steps.as_deref().map(steps).unwrap_or_default(),
        defaults::steps,
    );
    let domain_concepts = or_default(
        "mongodb_concepts",
        payload.mongodb_concepts.as_deref().map(concepts).unwrap_or_default(),
        defaults::concepts,
    );

    let summary_text = summarize(&target_schema, &code_transformations, &steps);

    NormalizedPlan { target_schema, code_transformations, steps, domain_concepts, summary_text }
}

fn or_default<T>(section: &str, items: Vec<T>, fallback: fn() -> Vec<T>) -> Vec<T> {
    if items.is_empty() {
        tracing::info!(section, "section falls back to defaults");
        fallback()
    } else {
        items
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

fn schema(section: Option<&SchemaSection>, model: &SourceModel) -> TargetSchema {
    let (collections, embedding, indexing) = match section {
        Some(SchemaSection::Structured { collections, embedding_strategy, indexing_strategy }) => (
            collections.iter().map(collection).collect::<Vec<_>>(),
            non_blank(embedding_strategy.as_ref()),
            non_blank(indexing_strategy.as_ref()).or_else(|| index_summary(collections)),
        ),
        Some(SchemaSection::Prose { description, embedding_strategy, indexing_strategy }) => (
            sections::collections_from_text(description),
            non_blank(embedding_strategy.as_ref())
                .or_else(|| sections::strategy_from_text(description, "embedding")),
            non_blank(indexing_strategy.as_ref())
                .or_else(|| sections::strategy_from_text(description, "index")),
        ),
        Some(SchemaSection::Strategies { embedding_strategy, indexing_strategy }) => (
            Vec::new(),
            non_blank(embedding_strategy.as_ref()),
            non_blank(indexing_strategy.as_ref()),
        ),
        None => (Vec::new(), None, None),
    };

    let collections = if collections.is_empty() {
        tracing::info!(section = "mongodb_schema", "collections fall back to one per entity");
        defaults::collections(model)
    } else {
        collections
    };

    TargetSchema {
        collections,
        embedding_strategy: embedding.unwrap_or_else(|| defaults::embedding_strategy(model)),
        indexing_strategy: indexing,
    }
}

fn collection(spec: &CollectionSpec) -> Collection {
    Collection {
        name: spec.name.clone(),
        fields: spec
            .fields
            .iter()
            .map(|f| CollectionField {
                name: f.name.clone(),
                field_type: f.field_type.clone(),
                description: f.description.clone(),
            })
            .collect(),
    }
}

/// Renders `indexes` entries such as `{"fields": ["lastName"], "type": "text"}`.
fn index_summary(collections: &[CollectionSpec]) -> Option<String> {
    let mut parts = Vec::new();
    for spec in collections {
        for index in &spec.indexes {
            let fields: Vec<&str> = match index {
                Value::String(field) => vec![field.as_str()],
                Value::Object(map) => match map.get("fields").or_else(|| map.get("field")) {
                    Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
                    Some(Value::String(field)) => vec![field.as_str()],
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            if fields.is_empty() {
                continue;
            }
            let kind = index.get("type").and_then(Value::as_str);
            parts.push(match kind {
                Some(kind) => format!("{}: {} ({kind})", spec.name, fields.join(", ")),
                None => format!("{}: {}", spec.name, fields.join(", ")),
            });
        }
    }
    (!parts.is_empty()).then(|| format!("Create indexes on {}.", parts.join("; ")))
}

/// Category of a file named by a recommendation: a known model file wins
/// over name-based inference.
fn category_of_file(file: &str, model: &SourceModel) -> FileCategory {
    let name = file.trim().rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let names_file = |source_path: &str, declared: &str| {
        !name.is_empty()
            && (source_path.rsplit('/').next() == Some(name) || declared.eq_ignore_ascii_case(stem))
    };

    if model.entities.iter().any(|e| names_file(&e.source_path, &e.name)) {
        FileCategory::Entity
    } else if model.data_access_units.iter().any(|u| names_file(&u.source_path, &u.name)) {
        FileCategory::DataAccess
    } else if model.configurations.iter().any(|c| c.source_path.rsplit('/').next() == Some(name)) {
        FileCategory::Configuration
    } else {
        FileCategory::infer(file)
    }
}

fn transformations(items: &[TransformationItem], model: &SourceModel) -> Vec<CodeTransformation> {
    let mut out = Vec::new();
    for item in items {
        match item {
            TransformationItem::PerFile { file, changes } => {
                let category = category_of_file(file, model);
                out.extend(changes.iter().map(|change| CodeTransformation {
                    file_category: category,
                    before_snippet: change.from.clone(),
                    after_snippet: change.to.clone(),
                    explanation: change
                        .explanation
                        .clone()
                        .unwrap_or_else(|| NO_EXPLANATION.to_string()),
                }));
            }
            TransformationItem::Flat { file_category, before, after, explanation } => {
                out.push(CodeTransformation {
                    file_category: FileCategory::infer(
                        file_category.as_deref().unwrap_or(before.as_str()),
                    ),
                    before_snippet: before.clone(),
                    after_snippet: after.clone(),
                    explanation: explanation.clone().unwrap_or_else(|| NO_EXPLANATION.to_string()),
                });
            }
            TransformationItem::Prose { description } => {
                out.extend(sections::transformation_from_text(description));
            }
        }
    }
    out
}

fn steps(items: &[StepItem]) -> Vec<MigrationStep> {
    items
        .iter()
        .zip(1u32..)
        .map(|(item, position)| match item {
            StepItem::Structured { step, title, description, code_example } => MigrationStep {
                order: *step,
                title: title.clone(),
                description: description.clone(),
                example_snippet: code_example.clone(),
            },
            StepItem::Prose { description } => sections::step_from_text(description, position),
        })
        .collect()
}

fn concepts(items: &[ConceptItem]) -> Vec<DomainConcept> {
    items
        .iter()
        .map(|item| match item {
            ConceptItem::Structured { concept, description, relevance } => DomainConcept {
                name: concept.clone(),
                description: description.clone(),
                relevance: relevance.clone().unwrap_or_else(|| GENERAL_RELEVANCE.to_string()),
            },
            ConceptItem::Prose { description } => sections::concept_from_text(description),
        })
        .collect()
}

fn summarize(
    schema: &TargetSchema,
    transformations: &[CodeTransformation],
    steps: &[MigrationStep],
) -> String {
    format!(
        "# Migration Plan Summary\n\n\
         This plan converts the application from a relational database to MongoDB.\n\n\
         ## Overview\n\
         - {collections} MongoDB collections will be created\n\
         - {transformations} code transformations are required\n\
         - The migration process consists of {steps} steps\n\n\
         ## Key Changes\n\
         - Entity classes will be converted to MongoDB documents\n\
         - JPA repositories will be replaced with MongoDB repositories\n\
         - Database configuration will be updated for MongoDB\n\n\
         ## Embedding Strategy\n\
         {embedding}\n\n\
         Follow the step-by-step migration process to complete the transition to MongoDB.\n",
        collections = schema.collections.len(),
        transformations = transformations.len(),
        steps = steps.len(),
        embedding = schema.embedding_strategy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssociationKind, Entity, Field, Relationship};
    use std::collections::BTreeSet;

    fn petclinic() -> SourceModel {
        let owner = Entity {
            name: "Owner".into(),
            source_path: "Owner.java".into(),
            fields: vec![
                Field::new("id", "Integer", BTreeSet::new(), true, None),
                Field::new(
                    "pets",
                    "Set<Pet>",
                    BTreeSet::new(),
                    false,
                    Some(AssociationKind::ToMany),
                )
                .with_target("Pet"),
            ],
            structural_tags: BTreeSet::from(["Entity".to_string()]),
            persisted_name: Some("owners".into()),
        };
        let pet = Entity {
            name: "Pet".into(),
            source_path: "Pet.java".into(),
            fields: vec![Field::new("name", "String", BTreeSet::new(), false, None)],
            structural_tags: BTreeSet::from(["Entity".to_string()]),
            persisted_name: None,
        };
        SourceModel {
            entities: vec![owner, pet],
            relationships: vec![Relationship {
                source_entity: "Owner".into(),
                target_entity: "Pet".into(),
                kind: AssociationKind::ToMany,
                source_field_name: "pets".into(),
                target_field_name: None,
            }],
            ..SourceModel::default()
        }
    }

    fn assert_complete(plan: &NormalizedPlan, model: &SourceModel) {
        assert!(plan.target_schema.collections.len() >= model.entities.len());
        assert!(!plan.target_schema.embedding_strategy.is_empty());
        assert!(!plan.code_transformations.is_empty());
        assert!(!plan.steps.is_empty());
        assert!(!plan.domain_concepts.is_empty());
        assert!(!plan.summary_text.is_empty());
    }

    #[test]
    fn empty_and_garbage_fall_back() {
        let model = petclinic();
        for text in ["", "¯\\_(ツ)_/¯", "{not json", "{\"unrelated\": true}"] {
            let plan = normalize(&Recommendation::parse(text), &model);
            assert_complete(&plan, &model);
            assert_eq!(plan.steps.len(), 7);
            assert_eq!(plan.code_transformations.len(), 6);
            assert_eq!(plan.domain_concepts.len(), 4);
            let names: Vec<&str> =
                plan.target_schema.collections.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["owners", "pets"]);
            assert_eq!(
                plan.target_schema.embedding_strategy,
                "Embed Pet within Owner for better read performance."
            );
        }
    }

    #[test]
    fn structured_recommendation_round_trips() {
        let text = r#"{
          "mongodb_schema": {
            "collections": [
              {"name": "owners", "fields": [{"name": "id", "type": "ObjectId", "description": "Primary key"}, {"name": "pets", "type": "Array"}],
               "indexes": [{"fields": ["lastName"], "type": "text"}]},
              {"name": "vets", "fields": []}
            ],
            "embedding_strategy": "Embed pets within owners."
          },
          "code_transformations": [
            {"file": "Entity.java", "changes": [{"from": "@Entity", "to": "@Document", "explanation": "Mark documents"}, {"from": "@Column", "to": "@Field"}]},
            {"file": "application.properties", "changes": [{"from": "spring.datasource.url", "to": "spring.data.mongodb.uri"}]}
          ],
          "migration_steps": [
            {"step": 1, "title": "Prepare", "description": "Install MongoDB."},
            {"step": 2, "title": "Convert", "description": "Rewrite entities.", "code_example": "@Document"}
          ],
          "mongodb_concepts": [
            {"concept": "Embedding", "description": "Nest owned data.", "relevance": "Owners own pets"}
          ]
        }"#;
        let model = petclinic();
        let plan = normalize(&Recommendation::parse(text), &model);

        assert_eq!(plan.target_schema.collections.len(), 2);
        assert_eq!(plan.target_schema.collections[0].fields[0].field_type, "ObjectId");
        assert_eq!(plan.target_schema.embedding_strategy, "Embed pets within owners.");
        assert_eq!(
            plan.target_schema.indexing_strategy.as_deref(),
            Some("Create indexes on owners: lastName (text).")
        );

        assert_eq!(plan.code_transformations.len(), 3);
        assert_eq!(plan.code_transformations[0].file_category, FileCategory::Entity);
        assert_eq!(plan.code_transformations[0].explanation, "Mark documents");
        assert_eq!(plan.code_transformations[1].explanation, NO_EXPLANATION);
        assert_eq!(plan.code_transformations[2].file_category, FileCategory::Configuration);

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].example_snippet.as_deref(), Some("@Document"));
        assert_eq!(plan.domain_concepts[0].relevance, "Owners own pets");
        assert!(plan.summary_text.contains("- 2 MongoDB collections will be created"));
        assert!(plan.summary_text.contains("- 3 code transformations are required"));
        assert!(plan.summary_text.contains("Embed pets within owners."));
    }

    #[test]
    fn plan_sections_read_back_unchanged() {
        let model = petclinic();
        let first = normalize(&Recommendation::Unstructured(String::new()), &model);
        let text = serde_json::json!({
            "code_transformations": first.code_transformations,
            "migration_steps": first.steps,
            "mongodb_concepts": first.domain_concepts,
        })
        .to_string();

        let second = normalize(&Recommendation::parse(&text), &model);
        assert_eq!(second.code_transformations, first.code_transformations);
        assert_eq!(second.steps, first.steps);
        assert_eq!(second.domain_concepts, first.domain_concepts);
    }

    #[test]
    fn plan_field_names_are_accepted() {
        let text = r#"{
          "code_transformations": [
            {"file_category": "data_access", "before_snippet": "JpaRepository", "after_snippet": "MongoRepository"}
          ],
          "migration_steps": [
            {"order": 3, "title": "Add driver", "description": "Add the driver. Then rebuild.", "example_snippet": "dep"}
          ]
        }"#;
        let plan = normalize(&Recommendation::parse(text), &petclinic());

        assert_eq!(plan.code_transformations.len(), 1);
        assert_eq!(plan.code_transformations[0].file_category, FileCategory::DataAccess);
        assert_eq!(plan.code_transformations[0].before_snippet, "JpaRepository");
        assert_eq!(plan.code_transformations[0].after_snippet, "MongoRepository");
        assert_eq!(
            plan.steps,
            vec![MigrationStep {
                order: 3,
                title: "Add driver".into(),
                description: "Add the driver. Then rebuild.".into(),
                example_snippet: Some("dep".into()),
            }]
        );
    }

    #[test]
    fn per_file_changes_use_model_file_categories() {
        let text = r#"{"code_transformations": [
            {"file": "src/main/java/Pet.java", "changes": [{"from": "@Entity", "to": "@Document"}]},
            {"file": "Unknown.java", "changes": [{"from": "a", "to": "b"}]}
        ]}"#;
        let plan = normalize(&Recommendation::parse(text), &petclinic());
        assert_eq!(plan.code_transformations[0].file_category, FileCategory::Entity);
        assert_eq!(plan.code_transformations[1].file_category, FileCategory::General);
    }

    #[test]
    fn missing_steps_use_canonical_steps_only() {
        let text = r#"{"mongodb_concepts": [{"name": "Sharding", "description": "Scale out."}]}"#;
        let plan = normalize(&Recommendation::parse(text), &petclinic());

        assert_eq!(plan.steps, defaults::steps());
        assert_eq!(plan.domain_concepts.len(), 1);
        assert_eq!(plan.domain_concepts[0].name, "Sharding");
        assert_eq!(plan.domain_concepts[0].relevance, GENERAL_RELEVANCE);
        assert_eq!(plan.target_schema.collections.len(), 2);
    }

    #[test]
    fn empty_sections_fall_back() {
        let text = r#"{"migration_steps": [], "code_transformations": [7, "x"]}"#;
        let plan = normalize(&Recommendation::parse(text), &petclinic());
        assert_eq!(plan.steps.len(), 7);
        assert_eq!(plan.code_transformations.len(), 6);
    }

    #[test]
    fn prose_without_pairs_falls_back() {
        let text = r#"{"code_transformations": [
            {"description": "Update repositories to use Mongo"},
            {"description": "Review every entity carefully"}
        ]}"#;
        let plan = normalize(&Recommendation::parse(text), &petclinic());
        assert_eq!(plan.code_transformations, defaults::transformations());

        let text = "Code Changes\n- Update repositories to use Mongo\n- from @Table to @Document\n";
        let plan = normalize(&Recommendation::parse(text), &petclinic());
        assert_eq!(plan.code_transformations.len(), 1);
        assert_eq!(plan.code_transformations[0].before_snippet, "@Table");
    }

    #[test]
    fn prose_recommendation_is_extracted() {
        let text = "\
MongoDB Schema Design
Owners Collection
- id: ObjectId
- pets: array of pets
Embedding strategy: keep pets inside their owner.

Code Changes
- from @Entity to @Document

Migration Steps
1. Install MongoDB. Then configure it.
2. Move the data.
";
        let model = petclinic();
        let plan = normalize(&Recommendation::parse(text), &model);

        assert_eq!(plan.target_schema.collections.len(), 1);
        assert_eq!(plan.target_schema.collections[0].name, "owners");
        assert!(plan.target_schema.embedding_strategy.starts_with("Embedding strategy: keep pets"));
        assert_eq!(plan.code_transformations.len(), 1);
        assert_eq!(plan.code_transformations[0].before_snippet, "@Entity");
        assert_eq!(plan.code_transformations[0].after_snippet, "@Document");
        let titles: Vec<&str> = plan.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Install MongoDB", "Move the data"]);
        assert_eq!(plan.steps[1].order, 2);
        assert_eq!(plan.domain_concepts.len(), 4);
        assert!(plan.summary_text.contains("- 1 MongoDB collections will be created"));
    }
}
