//! Prompt rendering for migration recommendations.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::model::{DataAccessUnit, Entity, SourceModel};

/// Renders the analysis of `model` as a prompt asking for the four
/// recommendation sections.
#[must_use]
pub fn render_prompt(model: &SourceModel) -> String {
    let entities: Vec<Value> = model.entities.iter().map(entity_json).collect();
    let units: Vec<Value> = model.data_access_units.iter().map(unit_json).collect();
    let configurations: Vec<&str> =
        model.configurations.iter().map(|c| c.source_path.as_str()).collect();
    let relationships: Vec<Value> = model
        .relationships
        .iter()
        .map(|r| json!([r.source_entity, r.kind.to_string(), r.target_entity]))
        .collect();

    let mut prompt = String::new();
    prompt.push_str(
        "Analyze the following Java application components and create a detailed plan \
         to migrate them from a relational database to MongoDB.\n\n",
    );
    prompt.push_str("# Application Analysis\n\n");
    let _ = writeln!(prompt, "## Entities\n{}\n", pretty(&entities));
    let _ = writeln!(prompt, "## Repositories\n{}\n", pretty(&units));
    let _ = writeln!(prompt, "## Database Configurations\n{}\n", pretty(&configurations));
    let _ = writeln!(prompt, "## Entity Relationships\n{}\n", pretty(&relationships));

    prompt.push_str(
        "# Migration Task\n\n\
         Your response should cover:\n\
         1. MongoDB Schema Design: document structure per entity, embedding vs. referencing, indexes.\n\
         2. Code Transformations: entity classes, repository interfaces, configuration.\n\
         3. Step-by-Step Migration Process: data migration, refactoring sequence, testing.\n\
         4. MongoDB Concepts: concepts and best practices relevant to this migration.\n\n\
         Respond with a single JSON object (no markdown fences) with these keys:\n\
         {\n  \
           \"mongodb_schema\": {\"collections\": [{\"name\": \"...\", \"fields\": [{\"name\": \"...\", \"type\": \"...\", \"description\": \"...\"}]}], \
         \"embedding_strategy\": \"...\", \"indexing_strategy\": \"...\"},\n  \
           \"code_transformations\": [{\"file\": \"...\", \"changes\": [{\"from\": \"...\", \"to\": \"...\", \"explanation\": \"...\"}]}],\n  \
           \"migration_steps\": [{\"step\": 1, \"title\": \"...\", \"description\": \"...\", \"code_example\": \"...\"}],\n  \
           \"mongodb_concepts\": [{\"concept\": \"...\", \"description\": \"...\", \"relevance\": \"...\"}]\n\
         }\n",
    );

    prompt
}

fn entity_json(entity: &Entity) -> Value {
    let fields: Vec<Value> = entity
        .fields
        .iter()
        .map(|f| {
            let mut field = json!({
                "name": f.name,
                "type": f.declared_type,
                "annotations": f.tags,
            });
            if f.is_identifier {
                field["is_id"] = json!(true);
            }
            if let Some(kind) = f.association_kind {
                field["is_relationship"] = json!(true);
                field["relationship_type"] = json!(kind.to_string());
                if let Some(target) = &f.target_entity_name {
                    field["target_entity"] = json!(target);
                }
            }
            field
        })
        .collect();

    let mut value = json!({
        "name": entity.name,
        "annotations": entity.structural_tags,
        "fields": fields,
    });
    if let Some(table) = &entity.persisted_name {
        value["table_name"] = json!(table);
    }
    value
}

fn unit_json(unit: &DataAccessUnit) -> Value {
    let methods: Vec<Value> = unit
        .operations
        .iter()
        .map(|op| {
            let mut method = json!({
                "name": op.name,
                "return_type": op.return_type,
                "parameters": op.parameters,
            });
            if let Some(query) = &op.custom_query {
                method["query"] = json!(query);
            }
            method
        })
        .collect();

    json!({
        "name": unit.name,
        "entity": unit.associated_entity_name,
        "extends": unit.base_interfaces,
        "methods": methods,
    })
}

fn pretty<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AssociationKind, ConfigKind, ConfigurationFile, Field, Operation, Parameter, Relationship,
    };
    use std::collections::BTreeSet;

    fn model() -> SourceModel {
        let mut id = Field::new("id", "Long", BTreeSet::from(["Id".to_string()]), true, None);
        id.tags.insert("GeneratedValue".into());
        let pets = Field::new(
            "pets",
            "Set<Pet>",
            BTreeSet::from(["OneToMany".to_string()]),
            false,
            Some(AssociationKind::ToMany),
        )
        .with_target("Pet");
        SourceModel {
            entities: vec![Entity {
                name: "Owner".into(),
                source_path: "Owner.java".into(),
                fields: vec![id, pets],
                structural_tags: BTreeSet::from(["Entity".to_string()]),
                persisted_name: Some("owners".into()),
            }],
            data_access_units: vec![DataAccessUnit {
                name: "OwnerRepository".into(),
                source_path: "OwnerRepository.java".into(),
                associated_entity_name: Some("Owner".into()),
                base_interfaces: BTreeSet::from(["JpaRepository".to_string()]),
                operations: vec![Operation {
                    name: "findByLastName".into(),
                    return_type: "List<Owner>".into(),
                    parameters: vec![Parameter {
                        name: "lastName".into(),
                        declared_type: "String".into(),
                    }],
                    custom_query: Some("SELECT o FROM Owner o".into()),
                }],
            }],
            configurations: vec![ConfigurationFile {
                source_path: "application.properties".into(),
                kind: ConfigKind::Properties,
                raw_content: "spring.datasource.url=jdbc:h2:mem:db".into(),
            }],
            relationships: vec![Relationship {
                source_entity: "Owner".into(),
                target_entity: "Pet".into(),
                kind: AssociationKind::ToMany,
                source_field_name: "pets".into(),
                target_field_name: None,
            }],
        }
    }

    #[test]
    fn prompt_contains_every_section() {
        let prompt = render_prompt(&model());
        for header in [
            "## Entities",
            "## Repositories",
            "## Database Configurations",
            "## Entity Relationships",
        ] {
            assert!(prompt.contains(header), "missing {header}");
        }
        for key in crate::recommend::SECTION_KEYS {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_carries_model_details() {
        let prompt = render_prompt(&model());
        assert!(prompt.contains("\"table_name\": \"owners\""));
        assert!(prompt.contains("\"is_id\": true"));
        assert!(prompt.contains("\"relationship_type\": \"ToMany\""));
        assert!(prompt.contains("\"target_entity\": \"Pet\""));
        assert!(prompt.contains("\"query\": \"SELECT o FROM Owner o\""));
        assert!(prompt.contains("application.properties"));
        assert!(!prompt.contains("jdbc:h2"));
    }

    #[test]
    fn empty_model_still_renders() {
        let prompt = render_prompt(&SourceModel::default());
        assert!(prompt.contains("## Entities\n[]"));
    }
}
